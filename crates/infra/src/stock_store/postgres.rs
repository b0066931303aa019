//! Postgres-backed stock table.
//!
//! Every adjustment is a single upsert:
//!
//! ```sql
//! INSERT INTO stocks (item_id, location_id, company_id, quantity) VALUES (..)
//! ON CONFLICT (item_id, location_id)
//! DO UPDATE SET quantity = stocks.quantity + EXCLUDED.quantity
//! ```
//!
//! so row creation and the increment are atomic at the database level.
//! `adjust_many` applies all movements of one document inside one transaction.

use std::sync::Arc;

use sqlx::postgres::PgRow;
use sqlx::{Executor, PgPool, Postgres, Row};
use tracing::instrument;
use uuid::Uuid;

use stockbook_core::{CompanyId, ItemId, LocationId};
use stockbook_inventory::{Stock, StockKey, StockMovement, StockStore, StockStoreError};

use crate::db::{self, SqlFailure, classify_sqlx_error};

#[derive(Debug, Clone)]
pub struct PostgresStockStore {
    pool: Arc<PgPool>,
}

impl PostgresStockStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    #[instrument(
        skip(self),
        fields(item_id = %key.item_id, location_id = %key.location_id),
        err
    )]
    pub async fn get_row(&self, key: &StockKey) -> Result<Option<Stock>, StockStoreError> {
        let row = sqlx::query(
            r#"
            SELECT item_id, location_id, company_id, quantity
            FROM stocks
            WHERE item_id = $1 AND location_id = $2
            "#,
        )
        .bind(key.item_id.as_uuid())
        .bind(key.location_id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_row", e))?;

        row.as_ref().map(stock_from_row).transpose()
    }

    #[instrument(
        skip(self),
        fields(company_id = %company_id, item_id = %key.item_id, location_id = %key.location_id),
        err
    )]
    pub async fn adjust_row(
        &self,
        company_id: CompanyId,
        key: StockKey,
        delta: i64,
    ) -> Result<Stock, StockStoreError> {
        upsert(&*self.pool, company_id, key, delta).await
    }

    #[instrument(
        skip(self, movements),
        fields(company_id = %company_id, location_id = %location_id, movements = movements.len()),
        err
    )]
    pub async fn adjust_rows(
        &self,
        company_id: CompanyId,
        location_id: LocationId,
        movements: &[StockMovement],
    ) -> Result<Vec<Stock>, StockStoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin", e))?;

        let mut rows = Vec::with_capacity(movements.len());
        for m in movements {
            rows.push(upsert(&mut *tx, company_id, StockKey::new(m.item_id, location_id), m.delta).await?);
        }

        tx.commit().await.map_err(|e| map_sqlx_error("commit", e))?;
        Ok(rows)
    }
}

impl StockStore for PostgresStockStore {
    fn get(&self, key: &StockKey) -> Result<Option<Stock>, StockStoreError> {
        db::block_on(self.get_row(key), StockStoreError::Unavailable)
    }

    fn adjust(
        &self,
        company_id: CompanyId,
        key: StockKey,
        delta: i64,
    ) -> Result<Stock, StockStoreError> {
        db::block_on(self.adjust_row(company_id, key, delta), StockStoreError::Unavailable)
    }

    fn adjust_many(
        &self,
        company_id: CompanyId,
        location_id: LocationId,
        movements: &[StockMovement],
    ) -> Result<Vec<Stock>, StockStoreError> {
        if movements.is_empty() {
            return Ok(vec![]);
        }
        db::block_on(
            self.adjust_rows(company_id, location_id, movements),
            StockStoreError::Unavailable,
        )
    }
}

async fn upsert<'e, E>(
    executor: E,
    company_id: CompanyId,
    key: StockKey,
    delta: i64,
) -> Result<Stock, StockStoreError>
where
    E: Executor<'e, Database = Postgres>,
{
    let row = sqlx::query(
        r#"
        INSERT INTO stocks (item_id, location_id, company_id, quantity)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (item_id, location_id)
        DO UPDATE SET quantity = stocks.quantity + EXCLUDED.quantity
        RETURNING item_id, location_id, company_id, quantity
        "#,
    )
    .bind(key.item_id.as_uuid())
    .bind(key.location_id.as_uuid())
    .bind(company_id.as_uuid())
    .bind(delta)
    .fetch_one(executor)
    .await
    .map_err(|e| map_sqlx_error("adjust", e))?;

    stock_from_row(&row)
}

fn stock_from_row(row: &PgRow) -> Result<Stock, StockStoreError> {
    let decode = |e: sqlx::Error| StockStoreError::Backend(format!("failed to decode stock row: {e}"));

    let item_id: Uuid = row.try_get("item_id").map_err(decode)?;
    let location_id: Uuid = row.try_get("location_id").map_err(decode)?;
    let company_id: Uuid = row.try_get("company_id").map_err(decode)?;
    let quantity: i64 = row.try_get("quantity").map_err(decode)?;

    Ok(Stock {
        key: StockKey::new(ItemId::from_uuid(item_id), LocationId::from_uuid(location_id)),
        company_id: CompanyId::from_uuid(company_id),
        quantity,
    })
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StockStoreError {
    match classify_sqlx_error(operation, err) {
        SqlFailure::Unavailable(msg) => StockStoreError::Unavailable(msg),
        SqlFailure::UniqueViolation(msg) | SqlFailure::Other(msg) => StockStoreError::Backend(msg),
    }
}
