//! Parties module: customers and vendors as they appear on documents and
//! journal lines.

pub mod party;

pub use party::{Counterparty, PartyId, PartyKind};
