// src/db/crm_repo.rs

use sqlx::{Executor, FromRow, Sqlite, SqliteConnection, sqlite::SqliteRow};

use crate::{
    common::error::AppError,
    models::{
        crm::{Client, ContactChanges, Employee, EmployeeChanges, NewContact, NewEmployee, Supplier},
        update::{SetClause, UpdateOutcome},
    },
};

const CLIENTS: &str = "clients";
const EMPLOYEES: &str = "funcionarios";
const SUPPLIERS: &str = "fornecedores";

const CONTACT_COLUMNS: &str = "id, nome, email, telefone, endereco, foto";
const EMPLOYEE_COLUMNS: &str = "id, nome, email, telefone, cargo, endereco, foto";

// Clientes, funcionários e fornecedores: o mesmo formato de contato em
// tabelas separadas. Só funcionários têm `cargo`.
#[derive(Clone, Default)]
pub struct CrmRepository;

impl CrmRepository {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    //  CLIENTES
    // =========================================================================

    pub async fn create_client<'e, E>(&self, executor: E, input: &NewContact) -> Result<Client, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        insert_contact(executor, CLIENTS, input).await
    }

    pub async fn list_clients<'e, E>(&self, executor: E) -> Result<Vec<Client>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        list_newest_first(executor, CLIENTS, CONTACT_COLUMNS).await
    }

    pub async fn find_client<'e, E>(&self, executor: E, id: i64) -> Result<Option<Client>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        find_by_id(executor, CLIENTS, CONTACT_COLUMNS, id).await
    }

    pub async fn update_client(
        &self,
        conn: &mut SqliteConnection,
        id: i64,
        changes: ContactChanges,
    ) -> Result<UpdateOutcome, AppError> {
        let clause = contact_clause(CLIENTS, changes)?;
        execute_update(conn, clause, id).await
    }

    pub async fn delete_client<'e, E>(&self, executor: E, id: i64) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        delete_by_id(executor, CLIENTS, id).await
    }

    // =========================================================================
    //  FUNCIONÁRIOS
    // =========================================================================

    pub async fn create_employee<'e, E>(&self, executor: E, input: &NewEmployee) -> Result<Employee, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let employee = sqlx::query_as::<_, Employee>(&format!(
            r#"
            INSERT INTO {EMPLOYEES} (nome, email, telefone, cargo, endereco, foto)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING {EMPLOYEE_COLUMNS}
            "#
        ))
        .bind(&input.contact.name)
        .bind(&input.contact.email)
        .bind(&input.contact.phone)
        .bind(&input.cargo)
        .bind(&input.contact.address)
        .bind(&input.contact.photo)
        .fetch_one(executor)
        .await?;

        Ok(employee)
    }

    pub async fn list_employees<'e, E>(&self, executor: E) -> Result<Vec<Employee>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        list_newest_first(executor, EMPLOYEES, EMPLOYEE_COLUMNS).await
    }

    pub async fn find_employee<'e, E>(&self, executor: E, id: i64) -> Result<Option<Employee>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        find_by_id(executor, EMPLOYEES, EMPLOYEE_COLUMNS, id).await
    }

    pub async fn update_employee(
        &self,
        conn: &mut SqliteConnection,
        id: i64,
        changes: EmployeeChanges,
    ) -> Result<UpdateOutcome, AppError> {
        let mut clause = contact_clause(EMPLOYEES, changes.contact)?;
        clause.nullable("cargo", changes.cargo);
        execute_update(conn, clause, id).await
    }

    pub async fn delete_employee<'e, E>(&self, executor: E, id: i64) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        delete_by_id(executor, EMPLOYEES, id).await
    }

    // =========================================================================
    //  FORNECEDORES
    // =========================================================================

    pub async fn create_supplier<'e, E>(&self, executor: E, input: &NewContact) -> Result<Supplier, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        insert_contact(executor, SUPPLIERS, input).await
    }

    pub async fn list_suppliers<'e, E>(&self, executor: E) -> Result<Vec<Supplier>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        list_newest_first(executor, SUPPLIERS, CONTACT_COLUMNS).await
    }

    pub async fn find_supplier<'e, E>(&self, executor: E, id: i64) -> Result<Option<Supplier>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        find_by_id(executor, SUPPLIERS, CONTACT_COLUMNS, id).await
    }

    pub async fn update_supplier(
        &self,
        conn: &mut SqliteConnection,
        id: i64,
        changes: ContactChanges,
    ) -> Result<UpdateOutcome, AppError> {
        let clause = contact_clause(SUPPLIERS, changes)?;
        execute_update(conn, clause, id).await
    }

    pub async fn delete_supplier<'e, E>(&self, executor: E, id: i64) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        delete_by_id(executor, SUPPLIERS, id).await
    }
}

// ---
// Helpers compartilhados pelas três tabelas
// ---

async fn insert_contact<'e, E, T>(executor: E, table: &str, input: &NewContact) -> Result<T, AppError>
where
    E: Executor<'e, Database = Sqlite>,
    T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
{
    let record = sqlx::query_as::<_, T>(&format!(
        r#"
        INSERT INTO {table} (nome, email, telefone, endereco, foto)
        VALUES (?, ?, ?, ?, ?)
        RETURNING {CONTACT_COLUMNS}
        "#
    ))
    .bind(&input.name)
    .bind(&input.email)
    .bind(&input.phone)
    .bind(&input.address)
    .bind(&input.photo)
    .fetch_one(executor)
    .await?;

    Ok(record)
}

// Mais recentes primeiro
async fn list_newest_first<'e, E, T>(executor: E, table: &str, columns: &str) -> Result<Vec<T>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
    T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
{
    let records = sqlx::query_as::<_, T>(&format!("SELECT {columns} FROM {table} ORDER BY id DESC"))
        .fetch_all(executor)
        .await?;
    Ok(records)
}

async fn find_by_id<'e, E, T>(executor: E, table: &str, columns: &str, id: i64) -> Result<Option<T>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
    T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
{
    let record = sqlx::query_as::<_, T>(&format!("SELECT {columns} FROM {table} WHERE id = ?"))
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(record)
}

// Apagar um id inexistente não é erro
async fn delete_by_id<'e, E>(executor: E, table: &str, id: i64) -> Result<(), AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(&format!("DELETE FROM {table} WHERE id = ?"))
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

fn contact_clause(table: &str, changes: ContactChanges) -> Result<SetClause<'static>, AppError> {
    let mut clause = SetClause::new(table);
    clause.required("nome", changes.name)?;
    clause.nullable("email", changes.email);
    clause.nullable("telefone", changes.phone);
    clause.nullable("endereco", changes.address);
    clause.nullable("foto", changes.photo);
    Ok(clause)
}

async fn execute_update(
    conn: &mut SqliteConnection,
    clause: SetClause<'static>,
    id: i64,
) -> Result<UpdateOutcome, AppError> {
    if clause.is_empty() {
        return Ok(UpdateOutcome::NoFieldsToUpdate);
    }
    let rows = clause.execute_for_id(conn, id).await?;
    Ok(UpdateOutcome::from_rows(rows))
}
