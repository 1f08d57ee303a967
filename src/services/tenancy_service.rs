// src/services/tenancy_service.rs

use chrono::Utc;

use crate::{
    common::{
        db_utils::{StorageLocator, TenantConnections, TenantContext},
        error::AppError,
    },
    db::TenantRepository,
    models::{
        tenancy::{Tenant, TenantSummary},
        update::{FieldUpdate, UpdateOutcome},
    },
};

/// Diretório de empresas: registro global + um banco isolado por empresa.
#[derive(Clone)]
pub struct TenantService {
    tenant_repo: TenantRepository,
    connections: TenantConnections,
}

impl TenantService {
    pub fn new(tenant_repo: TenantRepository, connections: TenantConnections) -> Self {
        Self { tenant_repo, connections }
    }

    /// Função pura do nome; não confere se a empresa existe.
    pub fn resolve_locator(&self, company_name: &str) -> StorageLocator {
        self.connections.resolve_locator(company_name)
    }

    /// LÓGICA DE NEGÓCIO: registra a empresa e provisiona o banco dela de forma
    /// atômica. O INSERT no registro só é confirmado depois que o esquema da
    /// empresa foi criado; se qualquer metade falhar, nada fica pela metade.
    pub async fn register_tenant(&self, name: &str, logo: Option<Vec<u8>>) -> Result<Tenant, AppError> {
        let locator = self.resolve_locator(name);

        if self.tenant_repo.find_by_locator(locator.slug()).await?.is_some() {
            return Err(AppError::TenantAlreadyExists(name.to_string()));
        }

        // Arquivo órfão (de um cadastro interrompido) não deve ser apagado num rollback
        let file_existed = tokio::fs::try_exists(locator.path()).await?;

        // 1. Inicia a transação no registro
        let mut tx = self.tenant_repo.pool().begin().await?;

        // 2. Cria a linha da empresa (se falhar, o drop do tx faz rollback)
        let tenant = self
            .tenant_repo
            .create_tenant(&mut *tx, name, locator.slug(), logo.as_deref(), Utc::now())
            .await?;

        // 3. Provisiona o banco isolado com o esquema completo
        if let Err(e) = self.connections.provision(&tenant.name).await {
            tracing::error!("🔥 Falha ao provisionar o banco da empresa '{}': {:?}", name, e);
            // O arquivo sai antes; o drop do tx desfaz o INSERT mesmo se o rollback falhar
            self.discard_new_file(&locator, file_existed).await;
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!("Falha no rollback do cadastro de '{}': {:?}", name, rollback_err);
            }
            return Err(e);
        }

        // 4. Commit; se falhar, o arquivo recém-criado sai junto
        if let Err(e) = tx.commit().await {
            tracing::error!("🔥 Falha ao confirmar o cadastro da empresa '{}': {:?}", name, e);
            self.discard_new_file(&locator, file_existed).await;
            return Err(e.into());
        }

        tracing::info!("✅ Empresa '{}' cadastrada (id {})", tenant.name, tenant.id);
        Ok(tenant)
    }

    async fn discard_new_file(&self, locator: &StorageLocator, file_existed: bool) {
        if file_existed {
            return;
        }
        if let Err(e) = self.connections.discard(locator).await {
            tracing::error!("Falha ao remover {}: {:?}", locator.path().display(), e);
        }
    }

    /// Empresas em ordem alfabética.
    pub async fn list_tenants(&self) -> Result<Vec<TenantSummary>, AppError> {
        self.tenant_repo.list_summaries().await
    }

    pub async fn find_tenant(&self, company_name: &str) -> Result<Option<Tenant>, AppError> {
        let locator = self.resolve_locator(company_name);
        self.tenant_repo.find_by_locator(locator.slug()).await
    }

    pub async fn get_logo(&self, company_name: &str) -> Result<Option<Vec<u8>>, AppError> {
        let locator = self.resolve_locator(company_name);
        self.tenant_repo.get_logo(locator.slug()).await
    }

    /// Única alteração permitida numa empresa depois do cadastro.
    pub async fn update_logo(&self, company_name: &str, logo: FieldUpdate<Vec<u8>>) -> Result<UpdateOutcome, AppError> {
        let new_logo = match logo {
            FieldUpdate::Keep => return Ok(UpdateOutcome::NoFieldsToUpdate),
            FieldUpdate::Set(bytes) => Some(bytes),
            FieldUpdate::Clear => None,
        };

        let Some(tenant) = self.find_tenant(company_name).await? else {
            return Ok(UpdateOutcome::NotFound);
        };

        let rows = self.tenant_repo.set_logo(self.tenant_repo.pool(), tenant.id, new_logo).await?;
        Ok(UpdateOutcome::from_rows(rows))
    }

    /// Resolve a empresa para um contexto pronto para uso.
    /// Empresa não cadastrada ou sem arquivo → `TenantNotFound`;
    /// arquivo corrompido → `DatabaseError`.
    pub async fn open_tenant(&self, company_name: &str) -> Result<TenantContext, AppError> {
        let tenant = self
            .find_tenant(company_name)
            .await?
            .ok_or_else(|| AppError::TenantNotFound(company_name.to_string()))?;

        match self.connections.open_existing(&tenant.name).await? {
            Some(ctx) => Ok(ctx),
            None => {
                tracing::warn!("Empresa '{}' cadastrada, mas o arquivo do banco não existe", tenant.name);
                Err(AppError::TenantNotFound(company_name.to_string()))
            }
        }
    }
}
