use serde::{Deserialize, Serialize};

use stockbook_core::{RecordId, ValueObject};

/// Party identifier (customer or vendor record).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartyId(pub RecordId);

impl PartyId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for PartyId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Party kind, persisted as `party_type` on journal lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PartyKind {
    Customer,
    Vendor,
}

impl PartyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartyKind::Customer => "CUSTOMER",
            PartyKind::Vendor => "VENDOR",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CUSTOMER" => Some(PartyKind::Customer),
            "VENDOR" => Some(PartyKind::Vendor),
            _ => None,
        }
    }
}

impl core::fmt::Display for PartyKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of the party attached to a sale, purchase or journal line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counterparty {
    pub party_id: PartyId,
    pub kind: PartyKind,
    pub name: String,
}

impl ValueObject for Counterparty {}

impl Counterparty {
    pub fn customer(party_id: PartyId, name: impl Into<String>) -> Self {
        Self {
            party_id,
            kind: PartyKind::Customer,
            name: name.into(),
        }
    }

    pub fn vendor(party_id: PartyId, name: impl Into<String>) -> Self {
        Self {
            party_id,
            kind: PartyKind::Vendor,
            name: name.into(),
        }
    }
}
