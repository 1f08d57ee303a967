// src/models/crm.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::update::FieldUpdate;

// --- CLIENTES ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: i64,
    #[sqlx(rename = "nome")]
    pub name: String,
    pub email: Option<String>,
    #[sqlx(rename = "telefone")]
    pub phone: Option<String>,
    #[sqlx(rename = "endereco")]
    pub address: Option<String>,
    #[sqlx(rename = "foto")]
    pub photo: Option<Vec<u8>>,
}

// --- FUNCIONÁRIOS ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: i64,
    #[sqlx(rename = "nome")]
    pub name: String,
    pub email: Option<String>,
    #[sqlx(rename = "telefone")]
    pub phone: Option<String>,
    // Cargo / função
    pub cargo: Option<String>,
    #[sqlx(rename = "endereco")]
    pub address: Option<String>,
    #[sqlx(rename = "foto")]
    pub photo: Option<Vec<u8>>,
}

// --- FORNECEDORES ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: i64,
    #[sqlx(rename = "nome")]
    pub name: String,
    pub email: Option<String>,
    #[sqlx(rename = "telefone")]
    pub phone: Option<String>,
    #[sqlx(rename = "endereco")]
    pub address: Option<String>,
    #[sqlx(rename = "foto")]
    pub photo: Option<Vec<u8>>,
}

// ---
// Dados de entrada
// ---

/// Dados de um novo contato. O nome não é validado aqui; isso é da UI.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContact {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub photo: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEmployee {
    #[serde(flatten)]
    pub contact: NewContact,
    pub cargo: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactChanges {
    pub name: FieldUpdate<String>,
    pub email: FieldUpdate<String>,
    pub phone: FieldUpdate<String>,
    pub address: FieldUpdate<String>,
    pub photo: FieldUpdate<Vec<u8>>,
}

impl ContactChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_keep()
            && self.email.is_keep()
            && self.phone.is_keep()
            && self.address.is_keep()
            && self.photo.is_keep()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmployeeChanges {
    #[serde(flatten)]
    pub contact: ContactChanges,
    pub cargo: FieldUpdate<String>,
}

impl EmployeeChanges {
    pub fn is_empty(&self) -> bool {
        self.contact.is_empty() && self.cargo.is_keep()
    }
}
