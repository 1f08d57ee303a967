// src/models/inventory.rs

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Row, sqlite::SqliteRow};
use validator::{Validate, ValidationError};

use crate::models::update::FieldUpdate;

// --- 1. Produtos ---
// `quantity` é um total em cache: só a regra de movimentação altera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: Decimal,
    pub quantity: i64,
    // Quantidade no cadastro; base para auditar o livro-razão
    pub initial_quantity: i64,
    pub brand: String,
    pub barcode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<Vec<u8>>,
}

// O SQLite não tem DECIMAL: `valor` é TEXT e o parse é feito aqui.
impl<'r> FromRow<'r, SqliteRow> for Product {
    fn from_row(row: &'r SqliteRow) -> sqlx::Result<Self> {
        let raw_price: String = row.try_get("valor")?;
        let price = Decimal::from_str(&raw_price).map_err(|e| sqlx::Error::ColumnDecode {
            index: "valor".to_string(),
            source: Box::new(e),
        })?;

        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("nome")?,
            price,
            quantity: row.try_get("quantidade")?,
            initial_quantity: row.try_get("quantidade_inicial")?,
            brand: row.try_get("marca")?,
            barcode: row.try_get("codigo_barra")?,
            photo: row.try_get("foto")?,
        })
    }
}

// ---
// Validação customizada
// ---
fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() && !val.is_zero() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

// `Keep` e `Clear` não têm valor para conferir; `Clear` é barrado no UPDATE.
fn validate_price_update(update: &FieldUpdate<Decimal>) -> Result<(), ValidationError> {
    match update {
        FieldUpdate::Set(price) => validate_not_negative(price),
        FieldUpdate::Keep | FieldUpdate::Clear => Ok(()),
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    #[validate(custom(function = "validate_not_negative"))]
    pub price: Decimal,
    // Estoque de abertura; a partir daqui só por movimentação
    #[validate(range(min = 0, message = "A quantidade inicial não pode ser negativa."))]
    pub quantity: i64,
    pub brand: String,
    pub barcode: String,
    pub photo: Option<Vec<u8>>,
}

/// Alterações de cadastro. Não existe campo de quantidade de propósito.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductChanges {
    pub name: FieldUpdate<String>,
    #[validate(custom(function = "validate_price_update"))]
    pub price: FieldUpdate<Decimal>,
    pub brand: FieldUpdate<String>,
    pub barcode: FieldUpdate<String>,
    pub photo: FieldUpdate<Vec<u8>>,
}

impl ProductChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_keep()
            && self.price.is_keep()
            && self.brand.is_keep()
            && self.barcode.is_keep()
            && self.photo.is_keep()
    }
}

// --- 2. Movimentações de Estoque ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(rename_all = "lowercase")] // Banco: 'in' / 'out'
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    In,
    Out,
}

impl MovementKind {
    /// Quantidade com sinal: entrada soma, saída subtrai.
    pub fn signed(self, quantity: i64) -> i64 {
        match self {
            MovementKind::In => quantity,
            MovementKind::Out => -quantity,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            MovementKind::In => MovementKind::Out,
            MovementKind::Out => MovementKind::In,
        }
    }

    /// Novo saldo depois da movimentação, ou `None` se ficaria negativo.
    pub fn apply(self, current: i64, quantity: i64) -> Option<i64> {
        current.checked_add(self.signed(quantity)).filter(|q| *q >= 0)
    }
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MovementKind::In => f.write_str("in"),
            MovementKind::Out => f.write_str("out"),
        }
    }
}

// --- STOCK MOVEMENT (Livro-razão, imutável) ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    pub id: i64,
    pub product_id: i64,
    // Cópia do código de barras no momento da movimentação
    pub barcode: String,
    // Sempre positiva; o sentido vem de `kind`
    pub quantity: i64,
    pub kind: MovementKind,
    pub origin: String,
    pub created_at: DateTime<Utc>,
}

impl StockMovement {
    pub fn signed_quantity(&self) -> i64 {
        self.kind.signed(self.quantity)
    }
}

// Linha da tela de estoque: movimentação + nome/marca atuais do produto
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StockMovementView {
    pub id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub brand: String,
    pub barcode: String,
    pub quantity: i64,
    pub kind: MovementKind,
    pub origin: String,
    pub created_at: DateTime<Utc>,
}

// --- 3. Auditoria ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerAudit {
    pub product_id: i64,
    pub cached_quantity: i64,
    pub initial_quantity: i64,
    pub ledger_delta: i64,
}

impl LedgerAudit {
    pub fn derived_quantity(&self) -> i64 {
        self.initial_quantity + self.ledger_delta
    }

    pub fn is_consistent(&self) -> bool {
        self.cached_quantity == self.derived_quantity()
    }
}
