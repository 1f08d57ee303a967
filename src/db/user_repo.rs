// src/db/user_repo.rs

use sqlx::{Executor, Sqlite, SqliteConnection};

use crate::common::error::{AppError, map_unique_violation};
use crate::models::auth::Credential;
use crate::models::update::{FieldUpdate, SetClause, UpdateOutcome};

const SELECT_CREDENTIAL: &str = "SELECT id, username, password, photo FROM users";

// O repositório de credenciais, responsável pela tabela 'users' de cada empresa.
// Não guarda pool: o banco vem do contexto da empresa.
#[derive(Clone, Default)]
pub struct UserRepository;

impl UserRepository {
    pub fn new() -> Self {
        Self
    }

    // Busca uma credencial pelo nome de usuário
    pub async fn find_by_username<'e, E>(&self, executor: E, username: &str) -> Result<Option<Credential>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let credential = sqlx::query_as::<_, Credential>(&format!("{SELECT_CREDENTIAL} WHERE username = ?"))
            .bind(username)
            .fetch_optional(executor)
            .await?;
        Ok(credential)
    }

    // Busca uma credencial pelo ID
    pub async fn find_by_id<'e, E>(&self, executor: E, id: i64) -> Result<Option<Credential>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let credential = sqlx::query_as::<_, Credential>(&format!("{SELECT_CREDENTIAL} WHERE id = ?"))
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(credential)
    }

    pub async fn list<'e, E>(&self, executor: E) -> Result<Vec<Credential>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let credentials = sqlx::query_as::<_, Credential>(&format!("{SELECT_CREDENTIAL} ORDER BY username ASC"))
            .fetch_all(executor)
            .await?;
        Ok(credentials)
    }

    // Cria uma credencial. Usuário repetido na mesma empresa vira erro amigável.
    pub async fn create_credential<'e, E>(
        &self,
        executor: E,
        username: &str,
        password_hash: &str,
        photo: Option<&[u8]>,
    ) -> Result<Credential, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Credential>(
            r#"
            INSERT INTO users (username, password, photo)
            VALUES (?, ?, ?)
            RETURNING id, username, password, photo
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .bind(photo)
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique_violation(e, || AppError::UsernameAlreadyExists(username.to_string())))
    }

    /// Atualização parcial. A senha já chega convertida em hash.
    pub async fn update_credential(
        &self,
        conn: &mut SqliteConnection,
        id: i64,
        username: FieldUpdate<String>,
        password_hash: FieldUpdate<String>,
        photo: FieldUpdate<Vec<u8>>,
    ) -> Result<UpdateOutcome, AppError> {
        let new_username = match &username {
            FieldUpdate::Set(name) => Some(name.clone()),
            _ => None,
        };

        let mut clause = SetClause::new("users");
        clause.required("username", username)?;
        clause.required("password", password_hash)?;
        clause.nullable("photo", photo);

        if clause.is_empty() {
            return Ok(UpdateOutcome::NoFieldsToUpdate);
        }

        let rows = clause.execute_for_id(conn, id).await.map_err(|e| {
            map_unique_violation(e, || AppError::UsernameAlreadyExists(new_username.unwrap_or_default()))
        })?;
        Ok(UpdateOutcome::from_rows(rows))
    }

    /// Troca o hash (usado na migração de hashes legados).
    pub async fn set_password_hash<'e, E>(&self, executor: E, id: i64, password_hash: &str) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query("UPDATE users SET password = ? WHERE id = ?")
            .bind(password_hash)
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn delete_credential<'e, E>(&self, executor: E, id: i64) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query("DELETE FROM users WHERE id = ?").bind(id).execute(executor).await?;
        Ok(())
    }
}
