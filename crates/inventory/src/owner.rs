//! Which subsystem owns stock movements for a document type.

use serde::{Deserialize, Serialize};

use crate::features::CompanyFeatures;

/// Exactly one owner touches stock for a given document type and company
/// configuration. Selected from freshly read features at call time.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockOwner {
    /// The sale/purchase hooks mutate stock directly.
    DirectUpdater,
    /// Goods Received Notes own stock increases.
    DeferToGrn,
    /// Delivery notes own stock decreases.
    DeferToDeliveryNote,
}

impl StockOwner {
    pub fn for_purchases(features: &CompanyFeatures) -> Self {
        if features.enable_grns {
            StockOwner::DeferToGrn
        } else {
            StockOwner::DirectUpdater
        }
    }

    pub fn for_sales(features: &CompanyFeatures) -> Self {
        if features.enable_delivery_notes {
            StockOwner::DeferToDeliveryNote
        } else {
            StockOwner::DirectUpdater
        }
    }

    pub fn is_direct(&self) -> bool {
        matches!(self, StockOwner::DirectUpdater)
    }
}
