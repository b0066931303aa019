use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use stockbook_core::{CompanyId, DomainError, DomainResult, Entity, ItemId, LocationId, RecordId};
use stockbook_parties::{Counterparty, PartyKind};

/// Sale identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SaleId(pub RecordId);

impl SaleId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for SaleId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Sale line: item, quantity, unit price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLine {
    pub line_no: u32,
    pub item_id: ItemId,
    pub quantity: i64,
    /// Price in smallest currency unit (e.g., cents).
    pub unit_price: i64,
}

/// Input line for [`NewSale`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSaleLine {
    pub item_id: ItemId,
    pub quantity: i64,
    pub unit_price: i64,
}

/// Command-style input used to build a validated [`Sale`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSale {
    pub id: SaleId,
    pub company_id: CompanyId,
    pub sale_number: Option<String>,
    pub sale_date: NaiveDate,
    pub location_id: Option<LocationId>,
    pub customer: Option<Counterparty>,
    pub lines: Vec<NewSaleLine>,
    pub subtotal: i64,
    pub tax_amount: i64,
    pub total: i64,
}

/// A committed sale document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    id: SaleId,
    company_id: CompanyId,
    sale_number: Option<String>,
    sale_date: NaiveDate,
    location_id: Option<LocationId>,
    customer: Option<Counterparty>,
    lines: Vec<SaleLine>,
    subtotal: i64,
    tax_amount: i64,
    total: i64,
}

impl Sale {
    /// Validate the input and assign line numbers in input order.
    pub fn new(input: NewSale) -> DomainResult<Self> {
        if input.lines.is_empty() {
            return Err(DomainError::validation("sale must have at least one line"));
        }
        if let Some(customer) = &input.customer {
            if customer.kind != PartyKind::Customer {
                return Err(DomainError::validation("sale counterparty must be a customer"));
            }
        }
        for line in &input.lines {
            if line.quantity <= 0 {
                return Err(DomainError::validation("quantity must be positive"));
            }
            if line.unit_price < 0 {
                return Err(DomainError::validation("unit price cannot be negative"));
            }
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
            .map(|(line, line_no)| SaleLine {
                line_no,
                item_id: line.item_id,
                quantity: line.quantity,
                unit_price: line.unit_price,
            })
            .collect();

        Ok(Self {
            id: input.id,
            company_id: input.company_id,
            sale_number: input.sale_number.filter(|n| !n.trim().is_empty()),
            sale_date: input.sale_date,
            location_id: input.location_id,
            customer: input.customer,
            lines,
            subtotal: input.subtotal,
            tax_amount: input.tax_amount,
            total: input.total,
        })
    }

    pub fn id_typed(&self) -> SaleId {
        self.id
    }

    pub fn company_id(&self) -> CompanyId {
        self.company_id
    }

    pub fn sale_number(&self) -> Option<&str> {
        self.sale_number.as_deref()
    }

    pub fn sale_date(&self) -> NaiveDate {
        self.sale_date
    }

    pub fn location_id(&self) -> Option<LocationId> {
        self.location_id
    }

    pub fn customer(&self) -> Option<&Counterparty> {
        self.customer.as_ref()
    }

    pub fn lines(&self) -> &[SaleLine] {
        &self.lines
    }

    pub fn subtotal(&self) -> i64 {
        self.subtotal
    }

    pub fn tax_amount(&self) -> i64 {
        self.tax_amount
    }

    /// Tax-inclusive total.
    pub fn total(&self) -> i64 {
        self.total
    }

    /// Sale number, or `SALE-{id}` when the document was never numbered.
    pub fn reference(&self) -> String {
        match &self.sale_number {
            Some(number) => number.clone(),
            None => format!("SALE-{}", self.id),
        }
    }
}

impl Entity for Sale {
    type Id = SaleId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
