// src/models/tenancy.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ---
// 1. Company (A "Empresa" / tenant)
// ---
// Linha do registro global `companies`. Só o logo muda depois do cadastro.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: i64,
    #[sqlx(rename = "nome")]
    pub name: String,
    // Slug do arquivo no diretório de dados
    pub locator: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<Vec<u8>>,
    pub created_at: DateTime<Utc>,
}

// ---
// 2. Resumo para listagens (tela de login)
// ---
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TenantSummary {
    pub id: i64,
    #[sqlx(rename = "nome")]
    pub name: String,
}
