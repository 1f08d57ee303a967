// src/services/auth.rs

use std::{fmt, str::FromStr};

use bcrypt::{hash, verify};
use sha2::{Digest, Sha256};

use crate::{
    common::{db_utils::TenantContext, error::AppError},
    db::UserRepository,
    models::{
        auth::{AuthenticatedUser, Credential, CredentialChanges},
        update::{FieldUpdate, UpdateOutcome},
    },
    services::tenancy_service::TenantService,
};

// ---
// Esquemas de senha
// ---

/// Formato usado para gravar senhas novas.
/// `LegacySha256` (SHA-256 sem salt) só existe para compatibilidade com bancos
/// antigos; a verificação aceita os dois formatos sempre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PasswordScheme {
    #[default]
    Bcrypt,
    LegacySha256,
}

impl FromStr for PasswordScheme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bcrypt" => Ok(PasswordScheme::Bcrypt),
            "legacy-sha256" | "sha256" => Ok(PasswordScheme::LegacySha256),
            other => Err(anyhow::anyhow!("Esquema de senha desconhecido: '{}'", other)),
        }
    }
}

impl fmt::Display for PasswordScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PasswordScheme::Bcrypt => f.write_str("bcrypt"),
            PasswordScheme::LegacySha256 => f.write_str("legacy-sha256"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordPolicy {
    pub scheme: PasswordScheme,
    pub bcrypt_cost: u32,
    /// Regrava com bcrypt um hash legado depois de um login correto.
    pub upgrade_legacy_hashes: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            scheme: PasswordScheme::Bcrypt,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            upgrade_legacy_hashes: false,
        }
    }
}

/// Hash legado: SHA-256 hexadecimal, sem salt.
pub fn legacy_sha256(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.as_bytes()))
}

fn is_bcrypt_hash(stored: &str) -> bool {
    stored.starts_with("$2")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Verification {
    valid: bool,
    legacy: bool,
}

// ---
// Serviço de credenciais e login
// ---

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    tenant_service: TenantService,
    policy: PasswordPolicy,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, tenant_service: TenantService, policy: PasswordPolicy) -> Self {
        Self { user_repo, tenant_service, policy }
    }

    async fn hash_password(&self, password: &str, scheme: PasswordScheme) -> Result<String, AppError> {
        match scheme {
            PasswordScheme::LegacySha256 => Ok(legacy_sha256(password)),
            PasswordScheme::Bcrypt => {
                let password_clone = password.to_owned();
                let cost = self.policy.bcrypt_cost;
                let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, cost))
                    .await
                    .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
                Ok(hashed)
            }
        }
    }

    async fn verify_password(&self, password: &str, stored: &str) -> Result<Verification, AppError> {
        if !is_bcrypt_hash(stored) {
            // Comparação do formato antigo, sem salt
            tracing::warn!("⚠️ Verificando senha com hash legado (SHA-256 sem salt)");
            return Ok(Verification { valid: legacy_sha256(password) == stored, legacy: true });
        }

        let password_clone = password.to_owned();
        let hash_clone = stored.to_owned();

        // Executa a verificação em um thread separado
        let valid = tokio::task::spawn_blocking(move || verify(&password_clone, &hash_clone))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        Ok(Verification { valid, legacy: false })
    }

    /// Cria uma credencial. Grava só o hash, nunca a senha.
    pub async fn create_credential(
        &self,
        ctx: &TenantContext,
        username: &str,
        password: &str,
        photo: Option<&[u8]>,
    ) -> Result<Credential, AppError> {
        let password_hash = self.hash_password(password, self.policy.scheme).await?;
        let credential = self
            .user_repo
            .create_credential(ctx.pool(), username, &password_hash, photo)
            .await?;

        tracing::info!("👤 Usuário '{}' criado na empresa '{}'", username, ctx.company_name());
        Ok(credential)
    }

    /// Login. Empresa inexistente, usuário inexistente e senha errada viram
    /// todos `InvalidCredentials`; banco ilegível continua sendo erro interno.
    pub async fn authenticate(
        &self,
        company_name: &str,
        username: &str,
        password: &str,
    ) -> Result<AuthenticatedUser, AppError> {
        let ctx = match self.tenant_service.open_tenant(company_name).await {
            Ok(ctx) => ctx,
            Err(AppError::TenantNotFound(_)) => {
                tracing::info!("Login recusado: empresa '{}' não existe", company_name);
                return Err(AppError::InvalidCredentials);
            }
            Err(e) => return Err(e.log_if_internal()),
        };

        let credential = self
            .user_repo
            .find_by_username(ctx.pool(), username)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let verification = self.verify_password(password, &credential.password_hash).await?;
        if !verification.valid {
            return Err(AppError::InvalidCredentials);
        }

        if verification.legacy && self.policy.upgrade_legacy_hashes {
            // A senha já foi conferida: falha na migração não derruba o login
            if let Err(e) = self.upgrade_legacy_hash(&ctx, credential.id, password).await {
                tracing::warn!("⚠️ Falha ao migrar o hash legado do usuário '{}': {:?}", credential.username, e);
            } else {
                tracing::info!("🔐 Hash legado do usuário '{}' migrado para bcrypt", credential.username);
            }
        }

        let company_logo = self.tenant_service.get_logo(ctx.company_name()).await?;

        Ok(AuthenticatedUser {
            id: credential.id,
            username: credential.username,
            company_name: ctx.company_name().to_string(),
            company_logo,
        })
    }

    async fn upgrade_legacy_hash(&self, ctx: &TenantContext, id: i64, password: &str) -> Result<(), AppError> {
        let upgraded = self.hash_password(password, PasswordScheme::Bcrypt).await?;
        self.user_repo.set_password_hash(ctx.pool(), id, &upgraded).await?;
        Ok(())
    }

    pub async fn list_credentials(&self, ctx: &TenantContext) -> Result<Vec<Credential>, AppError> {
        self.user_repo.list(ctx.pool()).await
    }

    pub async fn find_credential(&self, ctx: &TenantContext, id: i64) -> Result<Option<Credential>, AppError> {
        self.user_repo.find_by_id(ctx.pool(), id).await
    }

    pub async fn update_credential(
        &self,
        ctx: &TenantContext,
        id: i64,
        changes: CredentialChanges,
    ) -> Result<UpdateOutcome, AppError> {
        if changes.is_empty() {
            return Ok(UpdateOutcome::NoFieldsToUpdate);
        }

        let password_hash = match changes.password {
            FieldUpdate::Set(password) => FieldUpdate::Set(self.hash_password(&password, self.policy.scheme).await?),
            FieldUpdate::Keep => FieldUpdate::Keep,
            FieldUpdate::Clear => return Err(AppError::CannotClearRequiredField("password")),
        };

        let mut conn = ctx.pool().acquire().await?;
        self.user_repo
            .update_credential(&mut conn, id, changes.username, password_hash, changes.photo)
            .await
    }

    pub async fn delete_credential(&self, ctx: &TenantContext, id: i64) -> Result<(), AppError> {
        self.user_repo.delete_credential(ctx.pool(), id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_hash_matches_known_sha256() {
        // sha256("1234")
        assert_eq!(
            legacy_sha256("1234"),
            "03ac674216f3e15c761ee1a5e255f067953623c8b388b4459e13f978d7c846f4"
        );
    }

    #[test]
    fn bcrypt_hashes_are_detected_by_prefix() {
        assert!(is_bcrypt_hash("$2b$12$abcdefghijklmnopqrstuv"));
        assert!(!is_bcrypt_hash(&legacy_sha256("x")));
    }

    #[test]
    fn scheme_parses_from_config_strings() {
        assert_eq!("bcrypt".parse::<PasswordScheme>().unwrap(), PasswordScheme::Bcrypt);
        assert_eq!(" Legacy-SHA256 ".parse::<PasswordScheme>().unwrap(), PasswordScheme::LegacySha256);
        assert!("md5".parse::<PasswordScheme>().is_err());
    }
}
