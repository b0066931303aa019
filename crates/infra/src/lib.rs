//! Infrastructure layer: storage adapters, config, and order-entry orchestration.
//!
//! Every store comes in two flavours: an in-memory adapter for tests/dev and a
//! Postgres adapter built on `sqlx`. The Postgres adapters implement the sync store
//! traits by blocking on the ambient tokio runtime, so they must be called from a
//! thread that is not itself driving async tasks.

pub mod config;
pub mod db;
pub mod ledger_store;
pub mod order_entry;
pub mod stock_store;

#[cfg(test)]
mod integration_tests;

pub use config::{ConfigError, InfraConfig};
pub use ledger_store::{InMemoryLedgerStore, PostgresLedgerStore};
pub use order_entry::{
    DocumentStore, DocumentStoreError, InMemoryDocumentStore, OrderEntryError, OrderEntryService,
};
pub use stock_store::{
    InMemoryCompanyDirectory, InMemoryStockStore, PostgresCompanyDirectory, PostgresStockStore,
};
