// src/models/update.rs

use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::common::error::AppError;

// ---
// Atualização parcial explícita
// ---
// "Não mexer" e "limpar o campo" são coisas diferentes. Uma string vazia em
// `Set` é gravada como string vazia.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "op", content = "value")]
pub enum FieldUpdate<T> {
    Keep,
    Set(T),
    Clear,
}

impl<T> Default for FieldUpdate<T> {
    fn default() -> Self {
        FieldUpdate::Keep
    }
}

impl<T> FieldUpdate<T> {
    pub fn is_keep(&self) -> bool {
        matches!(self, FieldUpdate::Keep)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> FieldUpdate<U> {
        match self {
            FieldUpdate::Keep => FieldUpdate::Keep,
            FieldUpdate::Set(value) => FieldUpdate::Set(f(value)),
            FieldUpdate::Clear => FieldUpdate::Clear,
        }
    }
}

impl<T> From<Option<T>> for FieldUpdate<T> {
    /// `None` significa "não informado", nunca "limpar".
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldUpdate::Keep, FieldUpdate::Set)
    }
}

/// Resultado de um `update_*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpdateOutcome {
    Applied,
    /// Nenhum campo informado: nada foi escrito.
    NoFieldsToUpdate,
    /// O id não existe: nada foi escrito.
    NotFound,
}

// ---
// Montador do UPDATE dinâmico
// ---
pub(crate) struct SetClause<'args> {
    builder: QueryBuilder<'args, Sqlite>,
    columns: usize,
}

impl<'args> SetClause<'args> {
    pub(crate) fn new(table: &str) -> Self {
        Self {
            builder: QueryBuilder::new(format!("UPDATE {table} SET ")),
            columns: 0,
        }
    }

    fn push_column(&mut self, column: &str) {
        if self.columns > 0 {
            self.builder.push(", ");
        }
        self.builder.push(column).push(" = ");
        self.columns += 1;
    }

    /// Coluna que aceita NULL: `Clear` grava NULL.
    pub(crate) fn nullable<T>(&mut self, column: &str, update: FieldUpdate<T>)
    where
        T: 'args + sqlx::Encode<'args, Sqlite> + sqlx::Type<Sqlite>,
    {
        match update {
            FieldUpdate::Keep => {}
            FieldUpdate::Set(value) => {
                self.push_column(column);
                self.builder.push_bind(Some(value));
            }
            FieldUpdate::Clear => {
                self.push_column(column);
                self.builder.push_bind(None::<T>);
            }
        }
    }

    /// Coluna NOT NULL: `Clear` é rejeitado antes de qualquer escrita.
    pub(crate) fn required<T>(&mut self, column: &'static str, update: FieldUpdate<T>) -> Result<(), AppError>
    where
        T: 'args + sqlx::Encode<'args, Sqlite> + sqlx::Type<Sqlite>,
    {
        match update {
            FieldUpdate::Keep => Ok(()),
            FieldUpdate::Set(value) => {
                self.push_column(column);
                self.builder.push_bind(value);
                Ok(())
            }
            FieldUpdate::Clear => Err(AppError::CannotClearRequiredField(column)),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.columns == 0
    }

    /// Executa o UPDATE para um id e devolve as linhas afetadas.
    /// Sem colunas, não toca no banco.
    pub(crate) async fn execute_for_id(mut self, conn: &mut SqliteConnection, id: i64) -> sqlx::Result<u64> {
        if self.is_empty() {
            return Ok(0);
        }
        self.builder.push(" WHERE id = ").push_bind(id);
        let result = self.builder.build().execute(&mut *conn).await?;
        Ok(result.rows_affected())
    }
}

impl UpdateOutcome {
    pub(crate) fn from_rows(rows_affected: u64) -> Self {
        if rows_affected == 0 { UpdateOutcome::NotFound } else { UpdateOutcome::Applied }
    }
}
