//! Order entry: persisting sales and purchases with their stock side effects.
//!
//! ## Call sequence
//!
//! ```text
//! record_sale      before_sale_created → insert_sale → on_sale_created
//! delete_sale      remove_sale → on_sale_deleted
//! record_purchase  insert_purchase → on_purchase_created
//! delete_purchase  remove_purchase → on_purchase_deleted
//! ```
//!
//! If a stock hook fails after the document write, the document write is undone
//! so the document store and stock never disagree. Journal posting is a separate
//! call made by the caller once the document is recorded.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use thiserror::Error;
use tracing::{info, warn};

use stockbook_core::{CompanyId, DomainError};
use stockbook_inventory::{
    CompanyFeatureSource, StockError, StockLedgerUpdater, StockOutcome, StockStore,
};
use stockbook_purchasing::{Purchase, PurchaseId};
use stockbook_sales::{Sale, SaleId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DocumentStoreError {
    #[error("document conflict: {0}")]
    Conflict(String),

    #[error("document store unavailable: {0}")]
    Unavailable(String),
}

/// Storage for sale and purchase documents, scoped by company.
pub trait DocumentStore: Send + Sync {
    fn insert_sale(&self, sale: Sale) -> Result<(), DocumentStoreError>;

    fn remove_sale(
        &self,
        company_id: CompanyId,
        sale_id: SaleId,
    ) -> Result<Option<Sale>, DocumentStoreError>;

    fn insert_purchase(&self, purchase: Purchase) -> Result<(), DocumentStoreError>;

    fn remove_purchase(
        &self,
        company_id: CompanyId,
        purchase_id: PurchaseId,
    ) -> Result<Option<Purchase>, DocumentStoreError>;
}

impl<D> DocumentStore for Arc<D>
where
    D: DocumentStore + ?Sized,
{
    fn insert_sale(&self, sale: Sale) -> Result<(), DocumentStoreError> {
        (**self).insert_sale(sale)
    }

    fn remove_sale(
        &self,
        company_id: CompanyId,
        sale_id: SaleId,
    ) -> Result<Option<Sale>, DocumentStoreError> {
        (**self).remove_sale(company_id, sale_id)
    }

    fn insert_purchase(&self, purchase: Purchase) -> Result<(), DocumentStoreError> {
        (**self).insert_purchase(purchase)
    }

    fn remove_purchase(
        &self,
        company_id: CompanyId,
        purchase_id: PurchaseId,
    ) -> Result<Option<Purchase>, DocumentStoreError> {
        (**self).remove_purchase(company_id, purchase_id)
    }
}

/// In-memory document store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    sales: RwLock<HashMap<(CompanyId, SaleId), Sale>>,
    purchases: RwLock<HashMap<(CompanyId, PurchaseId), Purchase>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sale(&self, company_id: CompanyId, sale_id: SaleId) -> Option<Sale> {
        let map = self.sales.read().ok()?;
        map.get(&(company_id, sale_id)).cloned()
    }

    pub fn purchase(&self, company_id: CompanyId, purchase_id: PurchaseId) -> Option<Purchase> {
        let map = self.purchases.read().ok()?;
        map.get(&(company_id, purchase_id)).cloned()
    }

    pub fn sale_count(&self, company_id: CompanyId) -> usize {
        self.sales
            .read()
            .map(|m| m.keys().filter(|(c, _)| *c == company_id).count())
            .unwrap_or(0)
    }

    pub fn purchase_count(&self, company_id: CompanyId) -> usize {
        self.purchases
            .read()
            .map(|m| m.keys().filter(|(c, _)| *c == company_id).count())
            .unwrap_or(0)
    }
}

fn poisoned(_: impl std::fmt::Debug) -> DocumentStoreError {
    DocumentStoreError::Unavailable("document store lock poisoned".to_string())
}

impl DocumentStore for InMemoryDocumentStore {
    fn insert_sale(&self, sale: Sale) -> Result<(), DocumentStoreError> {
        let mut map = self.sales.write().map_err(poisoned)?;
        let key = (sale.company_id(), sale.id_typed());
        if map.contains_key(&key) {
            return Err(DocumentStoreError::Conflict(format!("sale {} already recorded", key.1)));
        }
        map.insert(key, sale);
        Ok(())
    }

    fn remove_sale(
        &self,
        company_id: CompanyId,
        sale_id: SaleId,
    ) -> Result<Option<Sale>, DocumentStoreError> {
        let mut map = self.sales.write().map_err(poisoned)?;
        Ok(map.remove(&(company_id, sale_id)))
    }

    fn insert_purchase(&self, purchase: Purchase) -> Result<(), DocumentStoreError> {
        let mut map = self.purchases.write().map_err(poisoned)?;
        let key = (purchase.company_id(), purchase.id_typed());
        if map.contains_key(&key) {
            return Err(DocumentStoreError::Conflict(format!(
                "purchase {} already recorded",
                key.1
            )));
        }
        map.insert(key, purchase);
        Ok(())
    }

    fn remove_purchase(
        &self,
        company_id: CompanyId,
        purchase_id: PurchaseId,
    ) -> Result<Option<Purchase>, DocumentStoreError> {
        let mut map = self.purchases.write().map_err(poisoned)?;
        Ok(map.remove(&(company_id, purchase_id)))
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrderEntryError {
    #[error(transparent)]
    Stock(#[from] StockError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Documents(#[from] DocumentStoreError),
}

pub struct OrderEntryService<D, S, F> {
    documents: D,
    stock: StockLedgerUpdater<S, F>,
}

impl<D, S, F> OrderEntryService<D, S, F>
where
    D: DocumentStore,
    S: StockStore,
    F: CompanyFeatureSource,
{
    pub fn new(documents: D, stock: StockLedgerUpdater<S, F>) -> Self {
        Self { documents, stock }
    }

    pub fn documents(&self) -> &D {
        &self.documents
    }

    pub fn stock(&self) -> &StockLedgerUpdater<S, F> {
        &self.stock
    }

    pub fn record_sale(&self, sale: Sale) -> Result<StockOutcome, OrderEntryError> {
        self.stock.before_sale_created(&sale)?;
        self.documents.insert_sale(sale.clone())?;

        match self.stock.on_sale_created(&sale) {
            Ok(outcome) => {
                info!(sale_id = %sale.id_typed(), company_id = %sale.company_id(), "sale recorded");
                Ok(outcome)
            }
            Err(err) => {
                warn!(sale_id = %sale.id_typed(), error = %err, "stock update failed; removing sale");
                self.documents.remove_sale(sale.company_id(), sale.id_typed())?;
                Err(err.into())
            }
        }
    }

    pub fn delete_sale(
        &self,
        company_id: CompanyId,
        sale_id: SaleId,
    ) -> Result<StockOutcome, OrderEntryError> {
        let sale = self
            .documents
            .remove_sale(company_id, sale_id)?
            .ok_or_else(|| DomainError::not_found(format!("sale {sale_id}")))?;

        match self.stock.on_sale_deleted(&sale) {
            Ok(outcome) => {
                info!(sale_id = %sale_id, company_id = %company_id, "sale deleted");
                Ok(outcome)
            }
            Err(err) => {
                warn!(sale_id = %sale_id, error = %err, "stock reversal failed; restoring sale");
                self.documents.insert_sale(sale)?;
                Err(err.into())
            }
        }
    }

    pub fn record_purchase(&self, purchase: Purchase) -> Result<StockOutcome, OrderEntryError> {
        self.documents.insert_purchase(purchase.clone())?;

        match self.stock.on_purchase_created(&purchase) {
            Ok(outcome) => {
                info!(
                    purchase_id = %purchase.id_typed(),
                    company_id = %purchase.company_id(),
                    "purchase recorded"
                );
                Ok(outcome)
            }
            Err(err) => {
                warn!(purchase_id = %purchase.id_typed(), error = %err, "stock update failed; removing purchase");
                self.documents
                    .remove_purchase(purchase.company_id(), purchase.id_typed())?;
                Err(err.into())
            }
        }
    }

    pub fn delete_purchase(
        &self,
        company_id: CompanyId,
        purchase_id: PurchaseId,
    ) -> Result<StockOutcome, OrderEntryError> {
        let purchase = self
            .documents
            .remove_purchase(company_id, purchase_id)?
            .ok_or_else(|| DomainError::not_found(format!("purchase {purchase_id}")))?;

        match self.stock.on_purchase_deleted(&purchase) {
            Ok(outcome) => {
                info!(purchase_id = %purchase_id, company_id = %company_id, "purchase deleted");
                Ok(outcome)
            }
            Err(err) => {
                warn!(purchase_id = %purchase_id, error = %err, "stock reversal failed; restoring purchase");
                self.documents.insert_purchase(purchase)?;
                Err(err.into())
            }
        }
    }
}
