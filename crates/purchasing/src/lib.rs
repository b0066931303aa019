//! Purchase documents (vendor bills that bring goods into a location).

pub mod purchase;

pub use purchase::{NewPurchase, NewPurchaseLine, Purchase, PurchaseId, PurchaseLine};
