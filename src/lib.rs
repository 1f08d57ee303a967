//! Núcleo de dados do VendaPRO: registro de empresas, um banco SQLite isolado
//! por empresa e os cadastros (usuários, clientes, funcionários, fornecedores,
//! produtos e livro-razão de estoque) que a interface desktop consome.

pub mod common;
pub mod config;
pub mod db;
pub mod models;
pub mod services;

pub use common::db_utils::{StorageLocator, TenantContext};
pub use common::error::AppError;
pub use config::{AppConfig, AppState};
