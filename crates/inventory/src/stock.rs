use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use stockbook_core::{CompanyId, Entity, ItemId, LocationId, ValueObject};

/// Unique key of a stock row: one row per (item, location).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StockKey {
    pub item_id: ItemId,
    pub location_id: LocationId,
}

impl StockKey {
    pub fn new(item_id: ItemId, location_id: LocationId) -> Self {
        Self { item_id, location_id }
    }
}

impl ValueObject for StockKey {}

/// On-hand quantity of one item at one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stock {
    pub key: StockKey,
    pub company_id: CompanyId,
    pub quantity: i64,
}

impl Stock {
    /// A freshly created row (quantity 0), as materialised on first movement.
    pub fn empty(company_id: CompanyId, key: StockKey) -> Self {
        Self {
            key,
            company_id,
            quantity: 0,
        }
    }
}

impl Entity for Stock {
    type Id = StockKey;

    fn id(&self) -> &Self::Id {
        &self.key
    }
}

/// Signed quantity change for one item.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    pub item_id: ItemId,
    pub delta: i64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StockStoreError {
    #[error("stock store unavailable: {0}")]
    Unavailable(String),

    #[error("stock store backend error: {0}")]
    Backend(String),
}

/// Stock row storage.
///
/// `adjust` must be atomic per row: create-if-absent at quantity 0 and add the
/// delta without a window for lost updates.
pub trait StockStore: Send + Sync {
    fn get(&self, key: &StockKey) -> Result<Option<Stock>, StockStoreError>;

    fn adjust(
        &self,
        company_id: CompanyId,
        key: StockKey,
        delta: i64,
    ) -> Result<Stock, StockStoreError>;

    /// Apply several movements at one location, returning the updated rows in
    /// movement order.
    fn adjust_many(
        &self,
        company_id: CompanyId,
        location_id: LocationId,
        movements: &[StockMovement],
    ) -> Result<Vec<Stock>, StockStoreError> {
        movements
            .iter()
            .map(|m| self.adjust(company_id, StockKey::new(m.item_id, location_id), m.delta))
            .collect()
    }
}

impl<S> StockStore for Arc<S>
where
    S: StockStore + ?Sized,
{
    fn get(&self, key: &StockKey) -> Result<Option<Stock>, StockStoreError> {
        (**self).get(key)
    }

    fn adjust(
        &self,
        company_id: CompanyId,
        key: StockKey,
        delta: i64,
    ) -> Result<Stock, StockStoreError> {
        (**self).adjust(company_id, key, delta)
    }

    fn adjust_many(
        &self,
        company_id: CompanyId,
        location_id: LocationId,
        movements: &[StockMovement],
    ) -> Result<Vec<Stock>, StockStoreError> {
        (**self).adjust_many(company_id, location_id, movements)
    }
}
