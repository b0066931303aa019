//! `stockbook-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives shared by the stock and ledger
//! modules (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{CompanyId, ItemId, LocationId, RecordId, UserId};
pub use value_object::ValueObject;
