// src/config.rs

use std::{env, path::PathBuf, str::FromStr};

use anyhow::Context;

use crate::{
    common::db_utils::{REGISTRY_MIGRATOR, TenantConnections, connect_sqlite},
    db::{CrmRepository, InventoryRepository, TenantRepository, UserRepository},
    services::{
        auth::{AuthService, PasswordPolicy, PasswordScheme},
        crm_service::CrmService,
        inventory_service::InventoryService,
        tenancy_service::TenantService,
    },
};

const DEFAULT_DATA_DIR: &str = "./data";
const DEFAULT_REGISTRY_FILE: &str = "companies.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
// Bancos das empresas ficam num subdiretório, longe do arquivo de registro
const TENANTS_SUBDIR: &str = "tenants";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub registry_file: String,
    pub max_connections: u32,
    pub password_policy: PasswordPolicy,
}

impl AppConfig {
    /// Configuração padrão apontando para um diretório de dados.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            registry_file: DEFAULT_REGISTRY_FILE.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            password_policy: PasswordPolicy::default(),
        }
    }

    /// Lê do ambiente (e do `.env`, se houver). Valor inválido é erro de configuração.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let data_dir = env::var("VENDAPRO_DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string());
        let registry_file = env::var("VENDAPRO_REGISTRY_FILE").unwrap_or_else(|_| DEFAULT_REGISTRY_FILE.to_string());

        let password_policy = PasswordPolicy {
            scheme: env_or("VENDAPRO_PASSWORD_SCHEME", PasswordScheme::Bcrypt)?,
            bcrypt_cost: env_or("VENDAPRO_BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            upgrade_legacy_hashes: env_or("VENDAPRO_UPGRADE_LEGACY_HASHES", false)?,
        };

        if password_policy.scheme == PasswordScheme::LegacySha256 {
            tracing::warn!("⚠️ Senhas novas serão gravadas com SHA-256 sem salt (modo legado)");
        }

        Ok(Self {
            data_dir: PathBuf::from(data_dir),
            registry_file,
            max_connections: env_or("VENDAPRO_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
            password_policy,
        })
    }

    pub fn registry_path(&self) -> PathBuf {
        self.data_dir.join(&self.registry_file)
    }

    pub fn tenants_dir(&self) -> PathBuf {
        self.data_dir.join(TENANTS_SUBDIR)
    }
}

fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("Valor inválido em {key}: '{raw}'")),
        Err(_) => Ok(default),
    }
}

// O estado compartilhado: é a superfície que a UI chama.
// Sem singletons globais; quem precisa recebe um clone.
#[derive(Clone)]
pub struct AppState {
    pub tenant_service: TenantService,
    pub auth_service: AuthService,
    pub crm_service: CrmService,
    pub inventory_service: InventoryService,
    connections: TenantConnections,
}

impl AppState {
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(config.tenants_dir())
            .await
            .with_context(|| format!("Falha ao criar o diretório de dados {}", config.data_dir.display()))?;

        // Conecta ao registro global, usando '?' para propagar erros
        let registry_pool = connect_sqlite(&config.registry_path(), true, config.max_connections).await?;
        REGISTRY_MIGRATOR.run(&registry_pool).await?;

        tracing::info!("✅ Registro de empresas aberto em {}", config.registry_path().display());

        // --- Monta o gráfico de dependências ---
        let connections = TenantConnections::new(config.tenants_dir(), config.max_connections);
        let tenant_service = TenantService::new(TenantRepository::new(registry_pool), connections.clone());
        let auth_service = AuthService::new(UserRepository::new(), tenant_service.clone(), config.password_policy);
        let crm_service = CrmService::new(CrmRepository::new());
        let inventory_service = InventoryService::new(InventoryRepository::new());

        Ok(Self {
            tenant_service,
            auth_service,
            crm_service,
            inventory_service,
            connections,
        })
    }

    /// Fecha os bancos das empresas abertos nesta sessão.
    pub async fn shutdown(&self) {
        self.connections.close_all().await;
        tracing::info!("Bancos das empresas fechados");
    }
}
