// src/models/auth.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::update::FieldUpdate;

// Credencial de acesso de uma empresa (tabela `users` do banco da empresa)
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub id: i64,
    pub username: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    #[sqlx(rename = "password")]
    pub password_hash: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<Vec<u8>>,
}

// Alterações parciais de uma credencial. A senha chega em texto puro e é
// convertida em hash pelo serviço.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CredentialChanges {
    pub username: FieldUpdate<String>,
    pub password: FieldUpdate<String>,
    pub photo: FieldUpdate<Vec<u8>>,
}

impl CredentialChanges {
    pub fn is_empty(&self) -> bool {
        self.username.is_keep() && self.password.is_keep() && self.photo.is_keep()
    }
}

// Resposta de uma autenticação bem-sucedida: o usuário e a empresa dele
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedUser {
    pub id: i64,
    pub username: String,
    pub company_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_logo: Option<Vec<u8>>,
}
