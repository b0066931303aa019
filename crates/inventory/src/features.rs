//! Company feature configuration consulted before any stock mutation.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use stockbook_core::CompanyId;

use crate::stock::StockStoreError;

/// Per-company toggles that decide who owns stock movements.
///
/// Missing keys deserialize as `false`, matching a company that never opted in.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyFeatures {
    /// Goods Received Notes take over stock increases from purchases.
    pub enable_grns: bool,
    /// Delivery notes take over stock decreases from sales.
    pub enable_delivery_notes: bool,
    pub allow_negative_stock: bool,
}

/// Read-only source of company configuration.
///
/// Implementations must read fresh values on every call; the updater never caches.
pub trait CompanyFeatureSource: Send + Sync {
    /// `Ok(None)` when the company is unknown.
    fn features(&self, company_id: CompanyId) -> Result<Option<CompanyFeatures>, StockStoreError>;
}

impl<S> CompanyFeatureSource for Arc<S>
where
    S: CompanyFeatureSource + ?Sized,
{
    fn features(&self, company_id: CompanyId) -> Result<Option<CompanyFeatures>, StockStoreError> {
        (**self).features(company_id)
    }
}
