//! Stock row storage adapters for [`StockStore`](stockbook_inventory::StockStore)
//! and company configuration lookups for
//! [`CompanyFeatureSource`](stockbook_inventory::CompanyFeatureSource).

pub mod companies;
pub mod in_memory;
pub mod postgres;

pub use companies::{InMemoryCompanyDirectory, PostgresCompanyDirectory};
pub use in_memory::InMemoryStockStore;
pub use postgres::PostgresStockStore;
