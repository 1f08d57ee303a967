// src/db/inventory_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite, SqliteConnection};

use crate::{
    common::error::{AppError, map_unique_violation},
    models::{
        inventory::{MovementKind, NewProduct, Product, ProductChanges, StockMovement, StockMovementView},
        update::{FieldUpdate, SetClause, UpdateOutcome},
    },
};

const SELECT_PRODUCT: &str =
    "SELECT id, nome, valor, quantidade, quantidade_inicial, marca, codigo_barra, foto FROM produto";

const SELECT_MOVEMENT: &str = r#"
    SELECT id, produto_id AS product_id, codigo_barra AS barcode, quantidade AS quantity,
           tipo AS kind, origem AS origin, data AS created_at
    FROM estoque
"#;

#[derive(Clone, Default)]
pub struct InventoryRepository;

impl InventoryRepository {
    pub fn new() -> Self {
        Self
    }

    // ---
    // Funções de "Leitura" (Getters)
    // ---

    pub async fn list_products<'e, E>(&self, executor: E) -> Result<Vec<Product>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let products = sqlx::query_as::<_, Product>(&format!("{SELECT_PRODUCT} ORDER BY id DESC"))
            .fetch_all(executor)
            .await?;
        Ok(products)
    }

    pub async fn find_product<'e, E>(&self, executor: E, id: i64) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let product = sqlx::query_as::<_, Product>(&format!("{SELECT_PRODUCT} WHERE id = ?"))
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(product)
    }

    /// Primeiro produto (menor id) cujo nome, marca ou código de barras contém o termo.
    /// `LIKE` do SQLite: não diferencia maiúsculas em ASCII.
    pub async fn search_product<'e, E>(&self, executor: E, term: &str) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let pattern = format!("%{}%", escape_like(term));
        let product = sqlx::query_as::<_, Product>(&format!(
            r#"{SELECT_PRODUCT}
            WHERE nome LIKE ? ESCAPE '\'
               OR marca LIKE ? ESCAPE '\'
               OR codigo_barra LIKE ? ESCAPE '\'
            ORDER BY id ASC
            LIMIT 1"#
        ))
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .fetch_optional(executor)
        .await?;
        Ok(product)
    }

    pub async fn find_stock_movement<'e, E>(&self, executor: E, id: i64) -> Result<Option<StockMovement>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let movement = sqlx::query_as::<_, StockMovement>(&format!("{SELECT_MOVEMENT} WHERE id = ?"))
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(movement)
    }

    pub async fn list_product_movements<'e, E>(
        &self,
        executor: E,
        product_id: i64,
    ) -> Result<Vec<StockMovement>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let movements = sqlx::query_as::<_, StockMovement>(&format!(
            "{SELECT_MOVEMENT} WHERE produto_id = ? ORDER BY id DESC"
        ))
        .bind(product_id)
        .fetch_all(executor)
        .await?;
        Ok(movements)
    }

    /// Tela de estoque: movimentações com nome e marca atuais do produto.
    pub async fn list_stock_movements<'e, E>(&self, executor: E) -> Result<Vec<StockMovementView>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let movements = sqlx::query_as::<_, StockMovementView>(
            r#"
            SELECT e.id, e.produto_id AS product_id, p.nome AS product_name, p.marca AS brand,
                   e.codigo_barra AS barcode, e.quantidade AS quantity, e.tipo AS kind,
                   e.origem AS origin, e.data AS created_at
            FROM estoque e
            JOIN produto p ON p.id = e.produto_id
            ORDER BY e.id DESC
            "#,
        )
        .fetch_all(executor)
        .await?;
        Ok(movements)
    }

    /// Soma com sinal de todas as movimentações do produto.
    pub async fn ledger_delta<'e, E>(&self, executor: E, product_id: i64) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let (delta,): (i64,) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(CASE tipo WHEN 'in' THEN quantidade ELSE -quantidade END), 0)
            FROM estoque
            WHERE produto_id = ?
            "#,
        )
        .bind(product_id)
        .fetch_one(executor)
        .await?;
        Ok(delta)
    }

    // ---
    // Funções de "Escrita" (Transacionais)
    // ---

    pub async fn create_product<'e, E>(&self, executor: E, input: &NewProduct) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO produto (nome, valor, quantidade, quantidade_inicial, marca, codigo_barra, foto)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id, nome, valor, quantidade, quantidade_inicial, marca, codigo_barra, foto
            "#,
        )
        .bind(&input.name)
        .bind(input.price.to_string())
        .bind(input.quantity)
        .bind(input.quantity)
        .bind(&input.brand)
        .bind(&input.barcode)
        .bind(&input.photo)
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique_violation(e, || AppError::BarcodeAlreadyExists(input.barcode.clone())))
    }

    /// Atualização de cadastro. A quantidade fica de fora: só muda por movimentação.
    pub async fn update_product(
        &self,
        conn: &mut SqliteConnection,
        id: i64,
        changes: ProductChanges,
    ) -> Result<UpdateOutcome, AppError> {
        let new_barcode = match &changes.barcode {
            FieldUpdate::Set(barcode) => Some(barcode.clone()),
            _ => None,
        };

        let mut clause = SetClause::new("produto");
        clause.required("nome", changes.name)?;
        clause.required("valor", changes.price.map(|price| price.to_string()))?;
        clause.required("marca", changes.brand)?;
        clause.required("codigo_barra", changes.barcode)?;
        clause.nullable("foto", changes.photo);

        if clause.is_empty() {
            return Ok(UpdateOutcome::NoFieldsToUpdate);
        }

        let rows = clause.execute_for_id(conn, id).await.map_err(|e| {
            map_unique_violation(e, || AppError::BarcodeAlreadyExists(new_barcode.unwrap_or_default()))
        })?;
        Ok(UpdateOutcome::from_rows(rows))
    }

    /// Exclui o produto; as movimentações dele saem junto (ON DELETE CASCADE).
    pub async fn delete_product<'e, E>(&self, executor: E, id: i64) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query("DELETE FROM produto WHERE id = ?").bind(id).execute(executor).await?;
        Ok(())
    }

    /// Aplica um delta ao saldo, só se o resultado não ficar negativo.
    /// Devolve `false` quando a guarda impediu a escrita.
    pub async fn apply_quantity_delta<'e, E>(&self, executor: E, product_id: i64, delta: i64) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            "UPDATE produto SET quantidade = quantidade + ? WHERE id = ? AND quantidade + ? >= 0",
        )
        .bind(delta)
        .bind(product_id)
        .bind(delta)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Registra uma movimentação no livro-razão.
    pub async fn record_stock_movement<'e, E>(
        &self,
        executor: E,
        product_id: i64,
        barcode: &str,
        quantity: i64,
        kind: MovementKind,
        origin: &str,
        created_at: DateTime<Utc>,
    ) -> Result<StockMovement, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let movement = sqlx::query_as::<_, StockMovement>(
            r#"
            INSERT INTO estoque (produto_id, codigo_barra, quantidade, tipo, origem, data)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id, produto_id AS product_id, codigo_barra AS barcode, quantidade AS quantity,
                      tipo AS kind, origem AS origin, data AS created_at
            "#,
        )
        .bind(product_id)
        .bind(barcode)
        .bind(quantity)
        .bind(kind)
        .bind(origin)
        .bind(created_at)
        .fetch_one(executor)
        .await?;

        Ok(movement)
    }
}

// `%`, `_` e `\` do usuário viram literais no LIKE
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
