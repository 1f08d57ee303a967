// src/common/db_utils.rs

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use sqlx::{
    migrate::Migrator,
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
};
use tokio::sync::{Mutex, MutexGuard};

use crate::common::error::AppError;

// Migrações embutidas no binário: uma para o registro global, outra para cada empresa.
pub(crate) static REGISTRY_MIGRATOR: Migrator = sqlx::migrate!("./migrations/registry");
pub(crate) static TENANT_MIGRATOR: Migrator = sqlx::migrate!("./migrations/tenant");

const DB_EXTENSION: &str = "db";

// ---
// Localizador: o "endereço" do banco de uma empresa
// ---

/// Identificador determinístico do arquivo de uma empresa.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageLocator {
    slug: String,
    path: PathBuf,
}

impl StorageLocator {
    /// Função pura do nome: não verifica se o arquivo existe.
    pub fn resolve(data_dir: &Path, company_name: &str) -> Self {
        let slug = normalize_company_name(company_name);
        let path = data_dir.join(format!("{slug}.{DB_EXTENSION}"));
        Self { slug, path }
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Minúsculas, espaços viram `_`. Separadores de caminho e pontuação também
/// viram `_`, então nenhum nome escapa do diretório de dados.
pub fn normalize_company_name(name: &str) -> String {
    let slug: String = name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();

    if slug.is_empty() { "_".to_string() } else { slug }
}

/// Abre (ou cria) um arquivo SQLite com as opções usadas em todo o núcleo.
pub(crate) async fn connect_sqlite(
    path: &Path,
    create_if_missing: bool,
    max_connections: u32,
) -> Result<SqlitePool, AppError> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(create_if_missing)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(3))
        .connect_with(options)
        .await?;

    Ok(pool)
}

// ---
// Contexto de empresa: a "chave" para o banco isolado
// ---

/// Handle para o banco de uma empresa já resolvida.
/// Clones compartilham o mesmo pool e o mesmo lock de escrita.
#[derive(Debug, Clone)]
pub struct TenantContext {
    company_name: String,
    locator: StorageLocator,
    pool: SqlitePool,
    write_lock: Arc<Mutex<()>>,
}

impl TenantContext {
    pub fn company_name(&self) -> &str {
        &self.company_name
    }

    pub fn locator(&self) -> &StorageLocator {
        &self.locator
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Serializa as operações de leitura-modificação-escrita desta empresa.
    pub async fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().await
    }
}

/// Cache de pools por localizador. Criado uma vez no `AppState` e passado adiante.
#[derive(Debug, Clone)]
pub struct TenantConnections {
    data_dir: PathBuf,
    max_connections: u32,
    contexts: Arc<Mutex<HashMap<String, TenantContext>>>,
}

impl TenantConnections {
    pub fn new(data_dir: PathBuf, max_connections: u32) -> Self {
        Self {
            data_dir,
            max_connections,
            contexts: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn resolve_locator(&self, company_name: &str) -> StorageLocator {
        StorageLocator::resolve(&self.data_dir, company_name)
    }

    /// Cria o arquivo (se preciso) e aplica o esquema completo da empresa.
    pub async fn provision(&self, company_name: &str) -> Result<TenantContext, AppError> {
        let locator = self.resolve_locator(company_name);
        let mut contexts = self.contexts.lock().await;

        if let Some(ctx) = contexts.get(locator.slug()) {
            return Ok(ctx.clone());
        }

        let pool = connect_sqlite(locator.path(), true, self.max_connections).await?;
        if let Err(e) = TENANT_MIGRATOR.run(&pool).await {
            pool.close().await;
            return Err(e.into());
        }

        tracing::info!("📦 Banco da empresa '{}' provisionado em {}", company_name, locator.path().display());

        let ctx = TenantContext {
            company_name: company_name.to_string(),
            locator: locator.clone(),
            pool,
            write_lock: Arc::new(Mutex::new(())),
        };
        contexts.insert(locator.slug().to_string(), ctx.clone());
        Ok(ctx)
    }

    /// Abre o banco de uma empresa existente. `None` quando o arquivo não existe;
    /// arquivo presente mas ilegível vira `AppError::DatabaseError`.
    pub async fn open_existing(&self, company_name: &str) -> Result<Option<TenantContext>, AppError> {
        let locator = self.resolve_locator(company_name);
        let mut contexts = self.contexts.lock().await;

        if let Some(ctx) = contexts.get(locator.slug()) {
            return Ok(Some(ctx.clone()));
        }

        if !tokio::fs::try_exists(locator.path()).await? {
            return Ok(None);
        }

        let pool = connect_sqlite(locator.path(), false, self.max_connections).await?;
        // Aplica migrações pendentes. Arquivos criados fora do núcleo não são
        // convertidos: `CREATE TABLE IF NOT EXISTS` não altera tabelas existentes.
        if let Err(e) = TENANT_MIGRATOR.run(&pool).await {
            pool.close().await;
            return Err(e.into());
        }

        let ctx = TenantContext {
            company_name: company_name.to_string(),
            locator: locator.clone(),
            pool,
            write_lock: Arc::new(Mutex::new(())),
        };
        contexts.insert(locator.slug().to_string(), ctx.clone());
        Ok(Some(ctx))
    }

    /// Desfaz um provisionamento: fecha o pool e apaga o arquivo e seus auxiliares.
    pub async fn discard(&self, locator: &StorageLocator) -> Result<(), AppError> {
        if let Some(ctx) = self.contexts.lock().await.remove(locator.slug()) {
            ctx.pool.close().await;
        }

        for suffix in ["", "-wal", "-shm", "-journal"] {
            let mut file = locator.path().as_os_str().to_owned();
            file.push(suffix);
            match tokio::fs::remove_file(&file).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        tracing::warn!("🧹 Banco da empresa descartado: {}", locator.path().display());
        Ok(())
    }

    /// Fecha todos os pools abertos (encerramento da aplicação).
    pub async fn close_all(&self) {
        let mut contexts = self.contexts.lock().await;
        for (_, ctx) in contexts.drain() {
            ctx.pool.close().await;
        }
    }
}
