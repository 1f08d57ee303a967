//src/main.rs

use tracing_subscriber::EnvFilter;
use vendapro::{AppConfig, AppState};

#[tokio::main]
async fn main() {
    // Inicializa o logger; RUST_LOG controla o nível (padrão: info)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // .expect() é bom aqui: se a configuração falhar, a aplicação não deve iniciar.
    let config = AppConfig::from_env().expect("Configuração inválida.");
    let app_state = AppState::new(config)
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    // A interface desktop é um colaborador externo: aqui só confirmamos que o
    // núcleo está de pé e mostramos as empresas disponíveis para login.
    match app_state.tenant_service.list_tenants().await {
        Ok(tenants) if tenants.is_empty() => {
            tracing::info!("Nenhuma empresa cadastrada ainda.");
        }
        Ok(tenants) => {
            for tenant in tenants {
                tracing::info!("🏢 Empresa #{}: {}", tenant.id, tenant.name);
            }
        }
        Err(e) => {
            tracing::error!("🔥 Falha ao listar empresas: {}", e.log_if_internal());
        }
    }

    app_state.shutdown().await;
}
