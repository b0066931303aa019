//! Fixed line recipes for each kind of posting.
//!
//! A recipe lists the accounts that must resolve (all of them, even when a line is
//! omitted) and the ordered line drafts. Line order is part of the contract: line 1
//! is always the primary debit-side line.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use stockbook_core::{CompanyId, DomainError, DomainResult};
use stockbook_parties::Counterparty;
use stockbook_purchasing::Purchase;
use stockbook_sales::Sale;

use crate::account::codes;
use crate::entry::{JournalSource, LineDraft};

/// Everything the engine needs to post one entry, minus numbering and accounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostingRecipe {
    pub company_id: CompanyId,
    pub entry_date: NaiveDate,
    pub reference: String,
    pub description: String,
    pub source: JournalSource,
    /// Codes resolved up front, in lookup order.
    pub accounts: Vec<String>,
    pub lines: Vec<LineDraft>,
}

/// Payload of a manual expense posting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseInput {
    pub company_id: CompanyId,
    pub expense_account_code: String,
    pub amount: i64,
    pub entry_date: NaiveDate,
    pub reference: String,
    pub description: String,
    pub party: Option<Counterparty>,
}

/// Dr Accounts Receivable (total) / Cr Sales Revenue (subtotal) / Cr Tax Payable (tax, if any).
pub fn for_sale(sale: &Sale) -> PostingRecipe {
    let reference = sale.reference();
    let description = match sale.customer() {
        Some(customer) => format!("Sale to {}", customer.name),
        None => format!("Sale {reference}"),
    };

    let mut lines = vec![
        LineDraft::debit(
            codes::ACCOUNTS_RECEIVABLE,
            sale.total(),
            format!("Receivable for {reference}"),
        )
        .with_party(sale.customer().cloned()),
        LineDraft::credit(
            codes::SALES_REVENUE,
            sale.subtotal(),
            format!("Revenue for {reference}"),
        ),
    ];
    if sale.tax_amount() > 0 {
        lines.push(LineDraft::credit(
            codes::TAX_PAYABLE,
            sale.tax_amount(),
            format!("Tax on {reference}"),
        ));
    }

    PostingRecipe {
        company_id: sale.company_id(),
        entry_date: sale.sale_date(),
        reference,
        description,
        source: JournalSource::Sale(sale.id_typed()),
        accounts: vec![
            codes::ACCOUNTS_RECEIVABLE.to_string(),
            codes::SALES_REVENUE.to_string(),
            codes::TAX_PAYABLE.to_string(),
        ],
        lines,
    }
}

/// Dr Purchases (subtotal) / Dr Tax (tax, if any) / Cr Accounts Payable (total).
pub fn for_purchase(purchase: &Purchase) -> PostingRecipe {
    let reference = purchase.reference();
    let description = match purchase.vendor() {
        Some(vendor) => format!("Purchase from {}", vendor.name),
        None => format!("Purchase {reference}"),
    };

    let mut lines = vec![LineDraft::debit(
        codes::PURCHASES,
        purchase.subtotal(),
        format!("Purchases for {reference}"),
    )];
    if purchase.tax_amount() > 0 {
        lines.push(LineDraft::debit(
            codes::TAX_PAYABLE,
            purchase.tax_amount(),
            format!("Tax on {reference}"),
        ));
    }
    lines.push(
        LineDraft::credit(
            codes::ACCOUNTS_PAYABLE,
            purchase.total(),
            format!("Payable for {reference}"),
        )
        .with_party(purchase.vendor().cloned()),
    );

    PostingRecipe {
        company_id: purchase.company_id(),
        entry_date: purchase.purchase_date(),
        reference,
        description,
        source: JournalSource::Purchase(purchase.id_typed()),
        accounts: vec![
            codes::ACCOUNTS_PAYABLE.to_string(),
            codes::PURCHASES.to_string(),
            codes::TAX_PAYABLE.to_string(),
        ],
        lines,
    }
}

/// Dr expense account / Cr Cash, same amount.
pub fn for_expense(input: &ExpenseInput) -> DomainResult<PostingRecipe> {
    if input.amount <= 0 {
        return Err(DomainError::validation("expense amount must be positive"));
    }
    if input.expense_account_code.trim().is_empty() {
        return Err(DomainError::validation("expense account code is required"));
    }

    Ok(PostingRecipe {
        company_id: input.company_id,
        entry_date: input.entry_date,
        reference: input.reference.clone(),
        description: input.description.clone(),
        source: JournalSource::Expense,
        accounts: vec![input.expense_account_code.clone(), codes::CASH.to_string()],
        lines: vec![
            LineDraft::debit(&input.expense_account_code, input.amount, input.description.clone())
                .with_party(input.party.clone()),
            LineDraft::credit(codes::CASH, input.amount, input.description.clone()),
        ],
    })
}
