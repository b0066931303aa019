//! Sales documents.
//!
//! A `Sale` is owned by the order-entry layer; this crate only models the
//! validated document that the stock updater and the journal engine consume.

pub mod sale;

pub use sale::{NewSale, NewSaleLine, Sale, SaleId, SaleLine};
