//! Journal storage adapters for [`LedgerStore`](stockbook_accounting::LedgerStore).

pub mod in_memory;
pub mod postgres;

pub use in_memory::{InMemoryLedgerStore, InMemoryLedgerTx};
pub use postgres::{PostgresLedgerStore, PostgresLedgerTx};
