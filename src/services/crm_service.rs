// src/services/crm_service.rs

use crate::{
    common::{db_utils::TenantContext, error::AppError},
    db::CrmRepository,
    models::{
        crm::{Client, ContactChanges, Employee, EmployeeChanges, NewContact, NewEmployee, Supplier},
        update::UpdateOutcome,
    },
};

// Cadastros simples de contato de uma empresa. Campos obrigatórios são
// validados pela UI; aqui só se grava.
#[derive(Clone)]
pub struct CrmService {
    repo: CrmRepository,
}

impl CrmService {
    pub fn new(repo: CrmRepository) -> Self {
        Self { repo }
    }

    // =========================================================================
    //  1. CLIENTES
    // =========================================================================

    pub async fn create_client(&self, ctx: &TenantContext, input: NewContact) -> Result<Client, AppError> {
        self.repo.create_client(ctx.pool(), &input).await
    }

    pub async fn list_clients(&self, ctx: &TenantContext) -> Result<Vec<Client>, AppError> {
        self.repo.list_clients(ctx.pool()).await
    }

    pub async fn find_client(&self, ctx: &TenantContext, id: i64) -> Result<Option<Client>, AppError> {
        self.repo.find_client(ctx.pool(), id).await
    }

    pub async fn update_client(
        &self,
        ctx: &TenantContext,
        id: i64,
        changes: ContactChanges,
    ) -> Result<UpdateOutcome, AppError> {
        if changes.is_empty() {
            return Ok(UpdateOutcome::NoFieldsToUpdate);
        }
        let mut conn = ctx.pool().acquire().await?;
        self.repo.update_client(&mut conn, id, changes).await
    }

    pub async fn delete_client(&self, ctx: &TenantContext, id: i64) -> Result<(), AppError> {
        self.repo.delete_client(ctx.pool(), id).await
    }

    // =========================================================================
    //  2. FUNCIONÁRIOS
    // =========================================================================

    pub async fn create_employee(&self, ctx: &TenantContext, input: NewEmployee) -> Result<Employee, AppError> {
        self.repo.create_employee(ctx.pool(), &input).await
    }

    pub async fn list_employees(&self, ctx: &TenantContext) -> Result<Vec<Employee>, AppError> {
        self.repo.list_employees(ctx.pool()).await
    }

    pub async fn find_employee(&self, ctx: &TenantContext, id: i64) -> Result<Option<Employee>, AppError> {
        self.repo.find_employee(ctx.pool(), id).await
    }

    pub async fn update_employee(
        &self,
        ctx: &TenantContext,
        id: i64,
        changes: EmployeeChanges,
    ) -> Result<UpdateOutcome, AppError> {
        if changes.is_empty() {
            return Ok(UpdateOutcome::NoFieldsToUpdate);
        }
        let mut conn = ctx.pool().acquire().await?;
        self.repo.update_employee(&mut conn, id, changes).await
    }

    pub async fn delete_employee(&self, ctx: &TenantContext, id: i64) -> Result<(), AppError> {
        self.repo.delete_employee(ctx.pool(), id).await
    }

    // =========================================================================
    //  3. FORNECEDORES
    // =========================================================================

    pub async fn create_supplier(&self, ctx: &TenantContext, input: NewContact) -> Result<Supplier, AppError> {
        self.repo.create_supplier(ctx.pool(), &input).await
    }

    pub async fn list_suppliers(&self, ctx: &TenantContext) -> Result<Vec<Supplier>, AppError> {
        self.repo.list_suppliers(ctx.pool()).await
    }

    pub async fn find_supplier(&self, ctx: &TenantContext, id: i64) -> Result<Option<Supplier>, AppError> {
        self.repo.find_supplier(ctx.pool(), id).await
    }

    pub async fn update_supplier(
        &self,
        ctx: &TenantContext,
        id: i64,
        changes: ContactChanges,
    ) -> Result<UpdateOutcome, AppError> {
        if changes.is_empty() {
            return Ok(UpdateOutcome::NoFieldsToUpdate);
        }
        let mut conn = ctx.pool().acquire().await?;
        self.repo.update_supplier(&mut conn, id, changes).await
    }

    pub async fn delete_supplier(&self, ctx: &TenantContext, id: i64) -> Result<(), AppError> {
        self.repo.delete_supplier(ctx.pool(), id).await
    }
}
