use std::collections::HashMap;
use std::sync::RwLock;

use stockbook_core::{CompanyId, LocationId};
use stockbook_inventory::{Stock, StockKey, StockMovement, StockStore, StockStoreError};

/// In-memory stock table.
///
/// Intended for tests/dev. Every adjustment holds the write lock across its
/// read-modify-write, so concurrent deltas are never lost.
#[derive(Debug, Default)]
pub struct InMemoryStockStore {
    rows: RwLock<HashMap<StockKey, Stock>>,
}

impl InMemoryStockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All rows belonging to `company_id`.
    pub fn list(&self, company_id: CompanyId) -> Vec<Stock> {
        let rows = match self.rows.read() {
            Ok(rows) => rows,
            Err(_) => return vec![],
        };
        rows.values()
            .filter(|s| s.company_id == company_id)
            .cloned()
            .collect()
    }

    /// Quantity for `key`, treating a missing row as zero.
    pub fn quantity(&self, key: &StockKey) -> i64 {
        self.rows
            .read()
            .ok()
            .and_then(|rows| rows.get(key).map(|s| s.quantity))
            .unwrap_or(0)
    }

    fn next(current: Stock, delta: i64) -> Result<Stock, StockStoreError> {
        let quantity = current.quantity.checked_add(delta).ok_or_else(|| {
            StockStoreError::Backend(format!(
                "quantity overflow for item {}",
                current.key.item_id
            ))
        })?;
        Ok(Stock { quantity, ..current })
    }
}

impl StockStore for InMemoryStockStore {
    fn get(&self, key: &StockKey) -> Result<Option<Stock>, StockStoreError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| StockStoreError::Unavailable("stock table lock poisoned".to_string()))?;
        Ok(rows.get(key).cloned())
    }

    fn adjust(
        &self,
        company_id: CompanyId,
        key: StockKey,
        delta: i64,
    ) -> Result<Stock, StockStoreError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| StockStoreError::Unavailable("stock table lock poisoned".to_string()))?;
        let current = rows
            .get(&key)
            .cloned()
            .unwrap_or_else(|| Stock::empty(company_id, key));
        let updated = Self::next(current, delta)?;
        rows.insert(key, updated.clone());
        Ok(updated)
    }

    fn adjust_many(
        &self,
        company_id: CompanyId,
        location_id: LocationId,
        movements: &[StockMovement],
    ) -> Result<Vec<Stock>, StockStoreError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| StockStoreError::Unavailable("stock table lock poisoned".to_string()))?;

        // Stage every row first so a failing movement leaves the table untouched.
        let mut staged: HashMap<StockKey, Stock> = HashMap::new();
        let mut updated = Vec::with_capacity(movements.len());
        for m in movements {
            let key = StockKey::new(m.item_id, location_id);
            let current = staged
                .get(&key)
                .or_else(|| rows.get(&key))
                .cloned()
                .unwrap_or_else(|| Stock::empty(company_id, key));
            let row = Self::next(current, m.delta)?;
            staged.insert(key, row.clone());
            updated.push(row);
        }

        rows.extend(staged);
        Ok(updated)
    }
}
