// src/services/inventory_service.rs

use chrono::Utc;
use sqlx::{Sqlite, SqliteConnection, Transaction};
use validator::Validate;

use crate::{
    common::{db_utils::TenantContext, error::AppError},
    db::InventoryRepository,
    models::{
        inventory::{
            LedgerAudit, MovementKind, NewProduct, Product, ProductChanges, StockMovement, StockMovementView,
        },
        update::UpdateOutcome,
    },
};

#[derive(Clone)]
pub struct InventoryService {
    inventory_repo: InventoryRepository,
}

impl InventoryService {
    pub fn new(inventory_repo: InventoryRepository) -> Self {
        Self { inventory_repo }
    }

    // --- PRODUTOS ---

    pub async fn create_product(&self, ctx: &TenantContext, input: NewProduct) -> Result<Product, AppError> {
        input.validate()?;

        let product = self.inventory_repo.create_product(ctx.pool(), &input).await?;
        tracing::info!(
            "🏷️ Produto '{}' ({}) criado na empresa '{}' com {} unidades",
            product.name,
            product.barcode,
            ctx.company_name(),
            product.quantity
        );
        Ok(product)
    }

    pub async fn list_products(&self, ctx: &TenantContext) -> Result<Vec<Product>, AppError> {
        self.inventory_repo.list_products(ctx.pool()).await
    }

    pub async fn find_product(&self, ctx: &TenantContext, id: i64) -> Result<Option<Product>, AppError> {
        self.inventory_repo.find_product(ctx.pool(), id).await
    }

    /// Busca por nome, marca ou código de barras. Termo vazio não encontra nada.
    pub async fn search_product(&self, ctx: &TenantContext, term: &str) -> Result<Option<Product>, AppError> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(None);
        }
        self.inventory_repo.search_product(ctx.pool(), term).await
    }

    pub async fn update_product(
        &self,
        ctx: &TenantContext,
        id: i64,
        changes: ProductChanges,
    ) -> Result<UpdateOutcome, AppError> {
        if changes.is_empty() {
            return Ok(UpdateOutcome::NoFieldsToUpdate);
        }
        changes.validate()?;

        let mut conn = ctx.pool().acquire().await?;
        self.inventory_repo.update_product(&mut conn, id, changes).await
    }

    pub async fn delete_product(&self, ctx: &TenantContext, id: i64) -> Result<(), AppError> {
        self.inventory_repo.delete_product(ctx.pool(), id).await
    }

    // --- MOVIMENTAÇÃO DE ESTOQUE ---

    /// Aplica uma entrada ou saída: atualiza o saldo do produto e grava a
    /// movimentação no livro-razão, tudo ou nada. Saída maior que o saldo é
    /// recusada sem escrever nada.
    pub async fn apply_stock_movement(
        &self,
        ctx: &TenantContext,
        product_id: i64,
        quantity: i64,
        kind: MovementKind,
        origin: &str,
    ) -> Result<StockMovement, AppError> {
        if quantity <= 0 {
            return Err(AppError::InvalidMovementQuantity(quantity));
        }

        let _guard = ctx.lock_writes().await;
        let mut tx = begin_write(ctx).await?;

        let movement = self.apply_movement(&mut tx, product_id, quantity, kind, origin).await?;

        tx.commit().await?;

        tracing::info!(
            "📦 Movimentação #{} ({} {}) do produto {} na empresa '{}'",
            movement.id,
            movement.kind,
            movement.quantity,
            product_id,
            ctx.company_name()
        );
        Ok(movement)
    }

    /// Estorno: o livro-razão não é editado; grava-se uma movimentação
    /// contrária pela mesma regra de saldo.
    pub async fn reverse_stock_movement(
        &self,
        ctx: &TenantContext,
        movement_id: i64,
        origin: &str,
    ) -> Result<StockMovement, AppError> {
        let _guard = ctx.lock_writes().await;
        let mut tx = begin_write(ctx).await?;

        let original = self
            .inventory_repo
            .find_stock_movement(&mut *tx, movement_id)
            .await?
            .ok_or(AppError::StockMovementNotFound(movement_id))?;

        let reversal = self
            .apply_movement(&mut tx, original.product_id, original.quantity, original.kind.opposite(), origin)
            .await?;

        tx.commit().await?;

        tracing::info!("↩️ Movimentação #{} estornada por #{}", movement_id, reversal.id);
        Ok(reversal)
    }

    // Regra de saldo + livro-razão dentro de uma transação já aberta.
    async fn apply_movement(
        &self,
        conn: &mut SqliteConnection,
        product_id: i64,
        quantity: i64,
        kind: MovementKind,
        origin: &str,
    ) -> Result<StockMovement, AppError> {
        let product = self
            .inventory_repo
            .find_product(&mut *conn, product_id)
            .await?
            .ok_or(AppError::ProductNotFound(product_id))?;

        let insufficient = || AppError::InsufficientStock {
            available: product.quantity,
            requested: quantity,
        };

        if kind.apply(product.quantity, quantity).is_none() {
            if kind == MovementKind::In {
                return Err(AppError::InvalidMovementQuantity(quantity));
            }
            tracing::warn!(
                "Estoque insuficiente para o produto {}: saldo {}, saída {}",
                product_id,
                product.quantity,
                quantity
            );
            return Err(insufficient());
        }

        // A guarda no SQL repete a checagem; o lock de escrita da empresa já
        // garante que ninguém mexeu no saldo entre a leitura e aqui.
        let applied = self
            .inventory_repo
            .apply_quantity_delta(&mut *conn, product_id, kind.signed(quantity))
            .await?;
        if !applied {
            return Err(insufficient());
        }

        self.inventory_repo
            .record_stock_movement(&mut *conn, product_id, &product.barcode, quantity, kind, origin, Utc::now())
            .await
    }

    pub async fn list_stock_movements(&self, ctx: &TenantContext) -> Result<Vec<StockMovementView>, AppError> {
        self.inventory_repo.list_stock_movements(ctx.pool()).await
    }

    pub async fn list_product_movements(
        &self,
        ctx: &TenantContext,
        product_id: i64,
    ) -> Result<Vec<StockMovement>, AppError> {
        self.inventory_repo.list_product_movements(ctx.pool(), product_id).await
    }

    /// Compara o saldo em cache com o saldo derivado do livro-razão.
    pub async fn audit_product_ledger(&self, ctx: &TenantContext, product_id: i64) -> Result<LedgerAudit, AppError> {
        let mut tx = ctx.pool().begin().await?;

        let product = self
            .inventory_repo
            .find_product(&mut *tx, product_id)
            .await?
            .ok_or(AppError::ProductNotFound(product_id))?;
        let ledger_delta = self.inventory_repo.ledger_delta(&mut *tx, product_id).await?;

        tx.commit().await?;

        let audit = LedgerAudit {
            product_id,
            cached_quantity: product.quantity,
            initial_quantity: product.initial_quantity,
            ledger_delta,
        };
        if !audit.is_consistent() {
            tracing::error!(
                "🔥 Saldo do produto {} divergente: cache {}, livro-razão {}",
                product_id,
                audit.cached_quantity,
                audit.derived_quantity()
            );
        }
        Ok(audit)
    }
}

// IMMEDIATE: o lock de escrita do SQLite é pego já no BEGIN, e a espera
// por outro escritor respeita o `busy_timeout`.
async fn begin_write(ctx: &TenantContext) -> Result<Transaction<'static, Sqlite>, AppError> {
    Ok(ctx.pool().begin_with("BEGIN IMMEDIATE").await?)
}
