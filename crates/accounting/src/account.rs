use serde::{Deserialize, Serialize};

use stockbook_core::{CompanyId, Entity, RecordId};

/// Well-known chart-of-account codes used by the posting recipes.
pub mod codes {
    pub const CASH: &str = "1110";
    pub const ACCOUNTS_RECEIVABLE: &str = "1130";
    pub const ACCOUNTS_PAYABLE: &str = "2110";
    pub const TAX_PAYABLE: &str = "2120";
    pub const SALES_REVENUE: &str = "4100";
    /// Purchases / cost of goods sold.
    pub const PURCHASES: &str = "5110";
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub RecordId);

impl AccountId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for AccountId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// High-level account kind (determines normal balance side).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Asset,
    Liability,
    Equity,
    Revenue,
    Expense,
}

impl AccountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Asset => "asset",
            AccountKind::Liability => "liability",
            AccountKind::Equity => "equity",
            AccountKind::Revenue => "revenue",
            AccountKind::Expense => "expense",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "asset" => Some(AccountKind::Asset),
            "liability" => Some(AccountKind::Liability),
            "equity" => Some(AccountKind::Equity),
            "revenue" => Some(AccountKind::Revenue),
            "expense" => Some(AccountKind::Expense),
            _ => None,
        }
    }
}

/// One account in a company's chart, identified by a company-scoped code.
///
/// Read-only from the posting engine's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartOfAccount {
    pub id: AccountId,
    pub company_id: CompanyId,
    pub code: String,
    pub name: String,
    pub kind: AccountKind,
    pub is_active: bool,
}

impl ChartOfAccount {
    pub fn new(
        company_id: CompanyId,
        code: impl Into<String>,
        name: impl Into<String>,
        kind: AccountKind,
    ) -> Self {
        Self {
            id: AccountId::new(RecordId::new()),
            company_id,
            code: code.into(),
            name: name.into(),
            kind,
            is_active: true,
        }
    }
}

impl Entity for ChartOfAccount {
    type Id = AccountId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// The accounts every posting recipe needs, active, for one company.
pub fn standard_accounts(company_id: CompanyId) -> Vec<ChartOfAccount> {
    vec![
        ChartOfAccount::new(company_id, codes::CASH, "Cash", AccountKind::Asset),
        ChartOfAccount::new(
            company_id,
            codes::ACCOUNTS_RECEIVABLE,
            "Accounts Receivable",
            AccountKind::Asset,
        ),
        ChartOfAccount::new(
            company_id,
            codes::ACCOUNTS_PAYABLE,
            "Accounts Payable",
            AccountKind::Liability,
        ),
        ChartOfAccount::new(company_id, codes::TAX_PAYABLE, "Tax Payable", AccountKind::Liability),
        ChartOfAccount::new(company_id, codes::SALES_REVENUE, "Sales Revenue", AccountKind::Revenue),
        ChartOfAccount::new(company_id, codes::PURCHASES, "Purchases", AccountKind::Expense),
    ]
}
