// src/db/tenancy_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite, SqlitePool};

use crate::common::error::{AppError, map_unique_violation};
use crate::models::tenancy::{Tenant, TenantSummary};

// Repositório do registro global de empresas (`companies`)
#[derive(Clone)]
pub struct TenantRepository {
    pool: SqlitePool,
}

impl TenantRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Busca pelo localizador, não pelo nome literal: "ACME" e "acme" são a mesma empresa.
    pub async fn find_by_locator(&self, locator: &str) -> Result<Option<Tenant>, AppError> {
        let tenant = sqlx::query_as::<_, Tenant>(
            "SELECT id, nome, locator, logo, created_at FROM companies WHERE locator = ?",
        )
        .bind(locator)
        .fetch_optional(&self.pool)
        .await?;
        Ok(tenant)
    }

    /// Lista em ordem alfabética (sem diferenciar maiúsculas).
    pub async fn list_summaries(&self) -> Result<Vec<TenantSummary>, AppError> {
        let tenants = sqlx::query_as::<_, TenantSummary>(
            "SELECT id, nome FROM companies ORDER BY nome COLLATE NOCASE ASC, nome ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(tenants)
    }

    pub async fn get_logo(&self, locator: &str) -> Result<Option<Vec<u8>>, AppError> {
        let logo: Option<(Option<Vec<u8>>,)> = sqlx::query_as("SELECT logo FROM companies WHERE locator = ?")
            .bind(locator)
            .fetch_optional(&self.pool)
            .await?;
        Ok(logo.and_then(|(bytes,)| bytes))
    }

    /// Insere a empresa. Roda dentro da transação de cadastro.
    pub async fn create_tenant<'e, E>(
        &self,
        executor: E,
        name: &str,
        locator: &str,
        logo: Option<&[u8]>,
        created_at: DateTime<Utc>,
    ) -> Result<Tenant, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Tenant>(
            r#"
            INSERT INTO companies (nome, locator, logo, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id, nome, locator, logo, created_at
            "#,
        )
        .bind(name)
        .bind(locator)
        .bind(logo)
        .bind(created_at)
        .fetch_one(executor)
        .await
        // Nome repetido ou nome que normaliza para o mesmo arquivo
        .map_err(|e| map_unique_violation(e, || AppError::TenantAlreadyExists(name.to_string())))
    }

    /// Grava (ou apaga, com `None`) o logo. Devolve as linhas afetadas.
    pub async fn set_logo<'e, E>(&self, executor: E, tenant_id: i64, logo: Option<Vec<u8>>) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("UPDATE companies SET logo = ? WHERE id = ?")
            .bind(logo)
            .bind(tenant_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
