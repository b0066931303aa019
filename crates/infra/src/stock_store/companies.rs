//! Company configuration lookups.
//!
//! Settings live in `companies.settings` (jsonb). Only the stock-related toggles
//! are read; unknown keys are ignored and missing ones default to `false`.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use sqlx::PgPool;
use tracing::instrument;

use stockbook_core::CompanyId;
use stockbook_inventory::{CompanyFeatureSource, CompanyFeatures, StockStoreError};

use crate::db::{self, SqlFailure, classify_sqlx_error};

/// In-memory company registry for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryCompanyDirectory {
    companies: RwLock<HashMap<CompanyId, CompanyFeatures>>,
}

impl InMemoryCompanyDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a company or replace its settings.
    pub fn upsert(&self, company_id: CompanyId, features: CompanyFeatures) {
        if let Ok(mut map) = self.companies.write() {
            map.insert(company_id, features);
        }
    }

    pub fn remove(&self, company_id: CompanyId) {
        if let Ok(mut map) = self.companies.write() {
            map.remove(&company_id);
        }
    }
}

impl CompanyFeatureSource for InMemoryCompanyDirectory {
    fn features(&self, company_id: CompanyId) -> Result<Option<CompanyFeatures>, StockStoreError> {
        let map = self
            .companies
            .read()
            .map_err(|_| StockStoreError::Unavailable("company registry lock poisoned".to_string()))?;
        Ok(map.get(&company_id).copied())
    }
}

#[derive(Debug, Clone)]
pub struct PostgresCompanyDirectory {
    pool: Arc<PgPool>,
}

impl PostgresCompanyDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    #[instrument(skip(self), fields(company_id = %company_id), err)]
    pub async fn load_features(
        &self,
        company_id: CompanyId,
    ) -> Result<Option<CompanyFeatures>, StockStoreError> {
        let settings: Option<Option<serde_json::Value>> =
            sqlx::query_scalar("SELECT settings FROM companies WHERE id = $1")
                .bind(company_id.as_uuid())
                .fetch_optional(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("load_features", e))?;

        settings
            .map(|value| parse_settings(value.unwrap_or(serde_json::Value::Null)))
            .transpose()
    }
}

impl CompanyFeatureSource for PostgresCompanyDirectory {
    fn features(&self, company_id: CompanyId) -> Result<Option<CompanyFeatures>, StockStoreError> {
        db::block_on(self.load_features(company_id), StockStoreError::Unavailable)
    }
}

/// Null settings mean a company that never configured anything.
fn parse_settings(value: serde_json::Value) -> Result<CompanyFeatures, StockStoreError> {
    if value.is_null() {
        return Ok(CompanyFeatures::default());
    }
    serde_json::from_value(value)
        .map_err(|e| StockStoreError::Backend(format!("invalid company settings: {e}")))
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StockStoreError {
    match classify_sqlx_error(operation, err) {
        SqlFailure::Unavailable(msg) => StockStoreError::Unavailable(msg),
        SqlFailure::UniqueViolation(msg) | SqlFailure::Other(msg) => StockStoreError::Backend(msg),
    }
}
