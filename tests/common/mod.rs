#![allow(dead_code)]

use tempfile::TempDir;
use vendapro::{
    AppConfig, AppState, TenantContext,
    services::auth::{PasswordPolicy, PasswordScheme},
};

// Custo mínimo do bcrypt: os testes não precisam de hashing lento
pub const TEST_BCRYPT_COST: u32 = 4;

pub struct TestApp {
    pub state: AppState,
    pub dir: TempDir,
}

pub fn test_config(dir: &TempDir) -> AppConfig {
    let mut config = AppConfig::with_data_dir(dir.path());
    config.password_policy = PasswordPolicy {
        scheme: PasswordScheme::Bcrypt,
        bcrypt_cost: TEST_BCRYPT_COST,
        upgrade_legacy_hashes: false,
    };
    config
}

pub async fn spawn_app() -> TestApp {
    let dir = TempDir::new().unwrap();
    let state = AppState::new(test_config(&dir)).await.unwrap();
    TestApp { state, dir }
}

impl TestApp {
    /// Outra instância sobre o mesmo diretório, com cache de conexões vazio.
    pub async fn reopen(&self, config: AppConfig) -> AppState {
        self.state.shutdown().await;
        AppState::new(config).await.unwrap()
    }

    pub async fn tenant(&self, name: &str) -> TenantContext {
        self.state.tenant_service.register_tenant(name, None).await.unwrap();
        self.state.tenant_service.open_tenant(name).await.unwrap()
    }
}
