// src/common/error.rs

use thiserror::Error;

// Todos os erros do núcleo. Regras de negócio violadas são valores
// recuperáveis; a UI decide como mostrá-los ao usuário.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Empresa não encontrada: {0}")]
    TenantNotFound(String),

    #[error("Já existe uma empresa com o nome '{0}'")]
    TenantAlreadyExists(String),

    #[error("Usuário '{0}' já existe nesta empresa")]
    UsernameAlreadyExists(String),

    #[error("Código de barras '{0}' já cadastrado")]
    BarcodeAlreadyExists(String),

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Produto {0} não encontrado")]
    ProductNotFound(i64),

    #[error("Movimentação de estoque {0} não encontrada")]
    StockMovementNotFound(i64),

    #[error("Estoque insuficiente: disponível {available}, solicitado {requested}")]
    InsufficientStock { available: i64, requested: i64 },

    #[error("A quantidade movimentada deve ser maior que zero (recebido {0})")]
    InvalidMovementQuantity(i64),

    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("O campo '{0}' é obrigatório e não pode ser limpo")]
    CannotClearRequiredField(&'static str),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro ao aplicar migrações: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Erro de E/S: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    // `anyhow::Error` guarda o contexto de falhas inesperadas (ex: task de hashing)
    #[error("Erro interno: {0}")]
    InternalServerError(#[from] anyhow::Error),
}

impl AppError {
    /// Erros de infraestrutura (banco ilegível, disco, tasks) em oposição
    /// às regras de negócio.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            AppError::DatabaseError(_)
                | AppError::MigrationError(_)
                | AppError::IoError(_)
                | AppError::BcryptError(_)
                | AppError::InternalServerError(_)
        )
    }

    /// Loga erros de infraestrutura com detalhes; regras de negócio passam em silêncio.
    pub fn log_if_internal(self) -> Self {
        if self.is_internal() {
            tracing::error!("Erro interno: {:?}", self);
        }
        self
    }
}

/// Converte violação de UNIQUE no erro de domínio correspondente.
pub(crate) fn map_unique_violation(e: sqlx::Error, on_unique: impl FnOnce() -> AppError) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return on_unique();
        }
    }
    e.into()
}
