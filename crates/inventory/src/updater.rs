//! Stock ledger updater: explicit hooks called by order entry around the
//! persistence of sales and purchases.
//!
//! Call sequence for a sale: `before_sale_created` → persist → `on_sale_created`.
//! For a purchase: persist → `on_purchase_created`. Deletions call the matching
//! `on_*_deleted` hook after the document is removed.
//!
//! Only the pre-creation check can reject an operation. Every other hook is best
//! effort: unknown company, missing location and feature deferral are logged and
//! reported through [`StockOutcome`], never as errors.

use thiserror::Error;
use tracing::{debug, info, warn};

use stockbook_core::{CompanyId, ItemId, LocationId};
use stockbook_purchasing::Purchase;
use stockbook_sales::Sale;

use crate::features::{CompanyFeatureSource, CompanyFeatures};
use crate::owner::StockOwner;
use crate::stock::{Stock, StockKey, StockMovement, StockStore, StockStoreError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StockError {
    #[error(
        "insufficient stock for item {item_id} at location {location_id}: available {available}, required {required}"
    )]
    InsufficientStock {
        item_id: ItemId,
        location_id: LocationId,
        available: i64,
        required: i64,
    },

    #[error(transparent)]
    Store(#[from] StockStoreError),
}

/// What a best-effort hook did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StockOutcome {
    /// Stock rows after the update, in line order.
    Applied(Vec<Stock>),
    /// Another subsystem owns this movement.
    Deferred(StockOwner),
    SkippedNoLocation,
    SkippedUnknownCompany,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum DocumentKind {
    Sale,
    Purchase,
}

impl DocumentKind {
    fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Sale => "sale",
            DocumentKind::Purchase => "purchase",
        }
    }

    fn owner(&self, features: &CompanyFeatures) -> StockOwner {
        match self {
            DocumentKind::Sale => StockOwner::for_sales(features),
            DocumentKind::Purchase => StockOwner::for_purchases(features),
        }
    }
}

/// Stock-relevant fields of a sale or purchase.
struct Movement {
    kind: DocumentKind,
    reference: String,
    company_id: CompanyId,
    location_id: Option<LocationId>,
    lines: Vec<(ItemId, i64)>,
}

impl Movement {
    fn of_sale(sale: &Sale) -> Self {
        Self {
            kind: DocumentKind::Sale,
            reference: sale.reference(),
            company_id: sale.company_id(),
            location_id: sale.location_id(),
            lines: sale.lines().iter().map(|l| (l.item_id, l.quantity)).collect(),
        }
    }

    fn of_purchase(purchase: &Purchase) -> Self {
        Self {
            kind: DocumentKind::Purchase,
            reference: purchase.reference(),
            company_id: purchase.company_id(),
            location_id: purchase.location_id(),
            lines: purchase.lines().iter().map(|l| (l.item_id, l.quantity)).collect(),
        }
    }
}

/// Keeps `Stock.quantity` consistent with sales and purchases.
#[derive(Debug)]
pub struct StockLedgerUpdater<S, F> {
    stocks: S,
    features: F,
}

impl<S, F> StockLedgerUpdater<S, F>
where
    S: StockStore,
    F: CompanyFeatureSource,
{
    pub fn new(stocks: S, features: F) -> Self {
        Self { stocks, features }
    }

    pub fn stocks(&self) -> &S {
        &self.stocks
    }

    /// Reject a sale that would drive stock negative.
    ///
    /// Runs only when delivery notes are disabled, negative stock is disallowed and
    /// the sale has a location. Quantities are summed per item across lines before
    /// comparing with what is on hand. Never mutates stock.
    pub fn before_sale_created(&self, sale: &Sale) -> Result<(), StockError> {
        let Some(features) = self.features.features(sale.company_id())? else {
            warn!(
                company_id = %sale.company_id(),
                reference = %sale.reference(),
                "unknown company; skipping stock availability check"
            );
            return Ok(());
        };

        if !StockOwner::for_sales(&features).is_direct() || features.allow_negative_stock {
            return Ok(());
        }
        let Some(location_id) = sale.location_id() else {
            return Ok(());
        };

        // `None` marks a requirement that overflowed i64; no stock level covers it.
        let mut required: Vec<(ItemId, Option<i64>)> = Vec::with_capacity(sale.lines().len());
        for line in sale.lines() {
            match required.iter_mut().find(|(item, _)| *item == line.item_id) {
                Some((_, qty)) => *qty = qty.and_then(|q| q.checked_add(line.quantity)),
                None => required.push((line.item_id, Some(line.quantity))),
            }
        }

        for (item_id, needed) in required {
            let available = self
                .stocks
                .get(&StockKey::new(item_id, location_id))?
                .map(|s| s.quantity)
                .unwrap_or(0);

            let short = needed.is_none_or(|n| n > available);
            if short {
                let required = needed.unwrap_or(i64::MAX);
                warn!(
                    %item_id,
                    %location_id,
                    available,
                    required,
                    "sale rejected: insufficient stock"
                );
                return Err(StockError::InsufficientStock {
                    item_id,
                    location_id,
                    available,
                    required,
                });
            }
        }

        Ok(())
    }

    pub fn on_sale_created(&self, sale: &Sale) -> Result<StockOutcome, StockError> {
        self.apply(Movement::of_sale(sale), -1)
    }

    pub fn on_sale_deleted(&self, sale: &Sale) -> Result<StockOutcome, StockError> {
        self.apply(Movement::of_sale(sale), 1)
    }

    pub fn on_purchase_created(&self, purchase: &Purchase) -> Result<StockOutcome, StockError> {
        self.apply(Movement::of_purchase(purchase), 1)
    }

    pub fn on_purchase_deleted(&self, purchase: &Purchase) -> Result<StockOutcome, StockError> {
        self.apply(Movement::of_purchase(purchase), -1)
    }

    fn apply(&self, doc: Movement, sign: i64) -> Result<StockOutcome, StockError> {
        let Some(features) = self.features.features(doc.company_id)? else {
            warn!(
                company_id = %doc.company_id,
                document = doc.kind.as_str(),
                reference = %doc.reference,
                "unknown company; skipping stock update"
            );
            return Ok(StockOutcome::SkippedUnknownCompany);
        };

        let owner = doc.kind.owner(&features);
        if !owner.is_direct() {
            debug!(
                company_id = %doc.company_id,
                document = doc.kind.as_str(),
                reference = %doc.reference,
                ?owner,
                "stock movement deferred"
            );
            return Ok(StockOutcome::Deferred(owner));
        }

        let Some(location_id) = doc.location_id else {
            warn!(
                company_id = %doc.company_id,
                document = doc.kind.as_str(),
                reference = %doc.reference,
                "document has no location; skipping stock update"
            );
            return Ok(StockOutcome::SkippedNoLocation);
        };

        let movements: Vec<StockMovement> = doc
            .lines
            .iter()
            .map(|(item_id, quantity)| StockMovement {
                item_id: *item_id,
                delta: sign * quantity,
            })
            .collect();

        let rows = self
            .stocks
            .adjust_many(doc.company_id, location_id, &movements)?;

        info!(
            company_id = %doc.company_id,
            %location_id,
            document = doc.kind.as_str(),
            reference = %doc.reference,
            lines = rows.len(),
            "stock updated"
        );

        Ok(StockOutcome::Applied(rows))
    }
}
