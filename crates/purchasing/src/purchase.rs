use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use stockbook_core::{CompanyId, DomainError, DomainResult, Entity, ItemId, LocationId, RecordId};
use stockbook_parties::{Counterparty, PartyKind};

/// Purchase identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PurchaseId(pub RecordId);

impl PurchaseId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for PurchaseId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Purchase line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseLine {
    pub line_no: u32,
    pub item_id: ItemId,
    pub quantity: i64,
    /// Cost in smallest currency unit.
    pub unit_cost: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPurchaseLine {
    pub item_id: ItemId,
    pub quantity: i64,
    pub unit_cost: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPurchase {
    pub id: PurchaseId,
    pub company_id: CompanyId,
    pub purchase_number: Option<String>,
    pub purchase_date: NaiveDate,
    pub location_id: Option<LocationId>,
    pub vendor: Option<Counterparty>,
    pub lines: Vec<NewPurchaseLine>,
    pub subtotal: i64,
    pub tax_amount: i64,
    pub total: i64,
}

/// A committed purchase document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    id: PurchaseId,
    company_id: CompanyId,
    purchase_number: Option<String>,
    purchase_date: NaiveDate,
    location_id: Option<LocationId>,
    vendor: Option<Counterparty>,
    lines: Vec<PurchaseLine>,
    subtotal: i64,
    tax_amount: i64,
    total: i64,
}

impl Purchase {
    pub fn new(input: NewPurchase) -> DomainResult<Self> {
        if input.lines.is_empty() {
            return Err(DomainError::validation("purchase must have at least one line"));
        }
        if let Some(vendor) = &input.vendor {
            if vendor.kind != PartyKind::Vendor {
                return Err(DomainError::validation("purchase counterparty must be a vendor"));
            }
        }
        if input.lines.iter().any(|l| l.quantity <= 0) {
            return Err(DomainError::validation("quantity must be positive"));
        }
        if input.lines.iter().any(|l| l.unit_cost < 0) {
            return Err(DomainError::validation("unit cost cannot be negative"));
        }
        if input.subtotal < 0 || input.tax_amount < 0 {
            return Err(DomainError::validation("amounts cannot be negative"));
        }
        if input.subtotal.checked_add(input.tax_amount) != Some(input.total) {
            return Err(DomainError::validation(format!(
                "total {} must equal subtotal {} plus tax {}",
                input.total, input.subtotal, input.tax_amount
            )));
        }

        let lines = input
            .lines
            .into_iter()
            .zip(1u32..)
            .map(|(line, line_no)| PurchaseLine {
                line_no,
                item_id: line.item_id,
                quantity: line.quantity,
                unit_cost: line.unit_cost,
            })
            .collect();

        Ok(Self {
            id: input.id,
            company_id: input.company_id,
            purchase_number: input.purchase_number.filter(|n| !n.trim().is_empty()),
            purchase_date: input.purchase_date,
            location_id: input.location_id,
            vendor: input.vendor,
            lines,
            subtotal: input.subtotal,
            tax_amount: input.tax_amount,
            total: input.total,
        })
    }

    pub fn id_typed(&self) -> PurchaseId {
        self.id
    }

    pub fn company_id(&self) -> CompanyId {
        self.company_id
    }

    pub fn purchase_number(&self) -> Option<&str> {
        self.purchase_number.as_deref()
    }

    pub fn purchase_date(&self) -> NaiveDate {
        self.purchase_date
    }

    pub fn location_id(&self) -> Option<LocationId> {
        self.location_id
    }

    pub fn vendor(&self) -> Option<&Counterparty> {
        self.vendor.as_ref()
    }

    pub fn lines(&self) -> &[PurchaseLine] {
        &self.lines
    }

    pub fn subtotal(&self) -> i64 {
        self.subtotal
    }

    pub fn tax_amount(&self) -> i64 {
        self.tax_amount
    }

    pub fn total(&self) -> i64 {
        self.total
    }

    /// Purchase number, or `PURCHASE-{id}`.
    pub fn reference(&self) -> String {
        match &self.purchase_number {
            Some(number) => number.clone(),
            None => format!("PURCHASE-{}", self.id),
        }
    }
}

impl Entity for Purchase {
    type Id = PurchaseId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
