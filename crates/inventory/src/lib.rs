//! Inventory domain module: on-hand stock per (item, location) and the updater
//! that keeps it in line with sales and purchases.
//!
//! Storage is abstracted behind [`StockStore`] and [`CompanyFeatureSource`];
//! adapters live in `stockbook-infra`.

pub mod features;
pub mod owner;
pub mod stock;
pub mod updater;

pub use features::{CompanyFeatureSource, CompanyFeatures};
pub use owner::StockOwner;
pub use stock::{Stock, StockKey, StockMovement, StockStore, StockStoreError};
pub use updater::{StockError, StockLedgerUpdater, StockOutcome};
