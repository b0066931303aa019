use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use stockbook_core::{CompanyId, DomainError, DomainResult, Entity, RecordId, UserId};
use stockbook_parties::Counterparty;
use stockbook_purchasing::PurchaseId;
use stockbook_sales::SaleId;

use crate::account::{AccountId, ChartOfAccount};
use crate::numbering::EntryNumber;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JournalEntryId(pub RecordId);

impl JournalEntryId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for JournalEntryId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Source-document type tag persisted as `source_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SourceType {
    Sale,
    Purchase,
    Expense,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Sale => "SALE",
            SourceType::Purchase => "PURCHASE",
            SourceType::Expense => "EXPENSE",
        }
    }
}

/// The document an entry was posted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JournalSource {
    Sale(SaleId),
    Purchase(PurchaseId),
    /// Manual expense; there is no stored source document.
    Expense,
}

impl JournalSource {
    pub fn source_type(&self) -> SourceType {
        match self {
            JournalSource::Sale(_) => SourceType::Sale,
            JournalSource::Purchase(_) => SourceType::Purchase,
            JournalSource::Expense => SourceType::Expense,
        }
    }

    pub fn source_id(&self) -> Option<Uuid> {
        match self {
            JournalSource::Sale(id) => Some(*id.0.as_uuid()),
            JournalSource::Purchase(id) => Some(*id.0.as_uuid()),
            JournalSource::Expense => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Debit,
    Credit,
}

/// A line before it is bound to a resolved account and a line number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineDraft {
    pub account_code: String,
    pub side: Side,
    /// Non-negative amount in smallest currency unit.
    pub amount: i64,
    pub description: String,
    pub party: Option<Counterparty>,
}

impl LineDraft {
    pub fn debit(account_code: &str, amount: i64, description: impl Into<String>) -> Self {
        Self {
            account_code: account_code.to_string(),
            side: Side::Debit,
            amount,
            description: description.into(),
            party: None,
        }
    }

    pub fn credit(account_code: &str, amount: i64, description: impl Into<String>) -> Self {
        Self {
            account_code: account_code.to_string(),
            side: Side::Credit,
            amount,
            description: description.into(),
            party: None,
        }
    }

    pub fn with_party(mut self, party: Option<Counterparty>) -> Self {
        self.party = party;
        self
    }
}

/// One debit-or-credit row of an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntryLine {
    pub line_number: u32,
    pub account_id: AccountId,
    pub account_code: String,
    pub description: String,
    /// Side the line was drafted on; kept explicitly so zero-amount lines stay
    /// on their recipe side.
    pub side: Side,
    pub debit_amount: i64,
    pub credit_amount: i64,
    pub party: Option<Counterparty>,
}

impl JournalEntryLine {
    pub fn side(&self) -> Side {
        self.side
    }

    /// The non-zero amount, or 0 for a zero-amount line.
    pub fn amount(&self) -> i64 {
        match self.side {
            Side::Debit => self.debit_amount,
            Side::Credit => self.credit_amount,
        }
    }
}

/// Header fields of a new, unposted entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewJournalEntry {
    pub id: JournalEntryId,
    pub company_id: CompanyId,
    pub entry_number: EntryNumber,
    pub entry_date: NaiveDate,
    pub reference: String,
    pub description: String,
    pub source: JournalSource,
    pub created_by: UserId,
}

/// A balanced accounting event.
///
/// Lines are numbered 1..N in the order they are added. Once posted, an entry
/// accepts no further lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    id: JournalEntryId,
    company_id: CompanyId,
    entry_number: EntryNumber,
    entry_date: NaiveDate,
    reference: String,
    description: String,
    source: JournalSource,
    created_by: UserId,
    posted_at: Option<DateTime<Utc>>,
    lines: Vec<JournalEntryLine>,
}

impl JournalEntry {
    pub fn new(header: NewJournalEntry) -> Self {
        Self {
            id: header.id,
            company_id: header.company_id,
            entry_number: header.entry_number,
            entry_date: header.entry_date,
            reference: header.reference,
            description: header.description,
            source: header.source,
            created_by: header.created_by,
            posted_at: None,
            lines: Vec::new(),
        }
    }

    /// Rebuild an entry from stored header and line rows.
    pub fn restore(
        header: NewJournalEntry,
        lines: Vec<JournalEntryLine>,
        posted_at: Option<DateTime<Utc>>,
    ) -> Self {
        let mut entry = Self::new(header);
        entry.lines = lines;
        entry.posted_at = posted_at;
        entry
    }

    /// Header fields, without lines or posting state.
    pub fn header(&self) -> NewJournalEntry {
        NewJournalEntry {
            id: self.id,
            company_id: self.company_id,
            entry_number: self.entry_number,
            entry_date: self.entry_date,
            reference: self.reference.clone(),
            description: self.description.clone(),
            source: self.source,
            created_by: self.created_by,
        }
    }

    pub fn id_typed(&self) -> JournalEntryId {
        self.id
    }

    pub fn company_id(&self) -> CompanyId {
        self.company_id
    }

    pub fn entry_number(&self) -> EntryNumber {
        self.entry_number
    }

    pub fn entry_date(&self) -> NaiveDate {
        self.entry_date
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn source(&self) -> JournalSource {
        self.source
    }

    pub fn created_by(&self) -> UserId {
        self.created_by
    }

    pub fn posted_at(&self) -> Option<DateTime<Utc>> {
        self.posted_at
    }

    pub fn is_posted(&self) -> bool {
        self.posted_at.is_some()
    }

    pub fn lines(&self) -> &[JournalEntryLine] {
        &self.lines
    }

    pub fn debit_total(&self) -> i128 {
        self.lines.iter().map(|l| l.debit_amount as i128).sum()
    }

    pub fn credit_total(&self) -> i128 {
        self.lines.iter().map(|l| l.credit_amount as i128).sum()
    }

    pub fn is_balanced(&self) -> bool {
        self.debit_total() == self.credit_total()
    }

    /// Bind a draft to its resolved account and append it as the next line.
    pub fn add_line(
        &mut self,
        account: &ChartOfAccount,
        draft: LineDraft,
    ) -> DomainResult<&JournalEntryLine> {
        if self.is_posted() {
            return Err(DomainError::invariant("posted entries are immutable"));
        }
        if account.company_id != self.company_id {
            return Err(DomainError::invariant("account belongs to another company"));
        }
        if account.code != draft.account_code {
            return Err(DomainError::invariant(format!(
                "line drafted for account {} bound to account {}",
                draft.account_code, account.code
            )));
        }
        if draft.amount < 0 {
            return Err(DomainError::validation("line amount cannot be negative"));
        }

        let (debit_amount, credit_amount) = match draft.side {
            Side::Debit => (draft.amount, 0),
            Side::Credit => (0, draft.amount),
        };
        let line_number = self.lines.len() as u32 + 1;

        self.lines.push(JournalEntryLine {
            line_number,
            account_id: account.id,
            account_code: account.code.clone(),
            description: draft.description,
            side: draft.side,
            debit_amount,
            credit_amount,
            party: draft.party,
        });

        Ok(&self.lines[self.lines.len() - 1])
    }

    /// Terminal transition: requires at least one line and debits equal to credits.
    pub fn post(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        if self.is_posted() {
            return Err(DomainError::conflict(format!(
                "journal entry {} already posted",
                self.entry_number
            )));
        }
        if self.lines.is_empty() {
            return Err(DomainError::validation("journal entry must have lines"));
        }
        if !self.is_balanced() {
            return Err(DomainError::invariant(format!(
                "debits must equal credits (debits {}, credits {})",
                self.debit_total(),
                self.credit_total()
            )));
        }
        self.posted_at = Some(at);
        Ok(())
    }
}

impl Entity for JournalEntry {
    type Id = JournalEntryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{AccountKind, codes};
    use crate::numbering::EntryPeriod;
    use proptest::prelude::*;

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn test_entry(company_id: CompanyId) -> JournalEntry {
        let entry_date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        JournalEntry::new(NewJournalEntry {
            id: JournalEntryId::new(RecordId::new()),
            company_id,
            entry_number: EntryNumber::next(EntryPeriod::of(entry_date), None).unwrap(),
            entry_date,
            reference: "REF-1".to_string(),
            description: "Test entry".to_string(),
            source: JournalSource::Expense,
            created_by: UserId::new(),
        })
    }

    fn account(company_id: CompanyId, code: &str, kind: AccountKind) -> ChartOfAccount {
        ChartOfAccount::new(company_id, code, code, kind)
    }

    #[test]
    fn balanced_entry_posts() {
        let company = CompanyId::new();
        let mut entry = test_entry(company);
        let cash = account(company, codes::CASH, AccountKind::Asset);
        let rent = account(company, "6100", AccountKind::Expense);

        entry.add_line(&rent, LineDraft::debit("6100", 100, "rent")).unwrap();
        entry.add_line(&cash, LineDraft::credit(codes::CASH, 100, "rent")).unwrap();
        entry.post(test_time()).unwrap();

        assert!(entry.is_posted());
        assert_eq!(entry.lines()[0].line_number, 1);
        assert_eq!(entry.lines()[1].line_number, 2);
        assert_eq!(entry.lines()[1].side(), Side::Credit);
    }

    #[test]
    fn unbalanced_entry_is_rejected() {
        let company = CompanyId::new();
        let mut entry = test_entry(company);
        let cash = account(company, codes::CASH, AccountKind::Asset);
        let rent = account(company, "6100", AccountKind::Expense);

        entry.add_line(&rent, LineDraft::debit("6100", 100, "rent")).unwrap();
        entry.add_line(&cash, LineDraft::credit(codes::CASH, 90, "rent")).unwrap();

        match entry.post(test_time()).unwrap_err() {
            DomainError::InvariantViolation(msg) if msg.contains("debits must equal credits") => {}
            other => panic!("expected invariant violation, got {other:?}"),
        }
        assert!(!entry.is_posted());
    }

    #[test]
    fn empty_entry_cannot_post() {
        let mut entry = test_entry(CompanyId::new());
        assert!(entry.post(test_time()).is_err());
    }

    #[test]
    fn posted_entry_is_immutable() {
        let company = CompanyId::new();
        let mut entry = test_entry(company);
        let cash = account(company, codes::CASH, AccountKind::Asset);
        entry.add_line(&cash, LineDraft::debit(codes::CASH, 5, "in")).unwrap();
        entry.add_line(&cash, LineDraft::credit(codes::CASH, 5, "out")).unwrap();
        entry.post(test_time()).unwrap();

        assert!(entry.add_line(&cash, LineDraft::debit(codes::CASH, 1, "late")).is_err());
        assert!(matches!(entry.post(test_time()), Err(DomainError::Conflict(_))));
    }

    #[test]
    fn rejects_foreign_account_and_negative_amounts() {
        let company = CompanyId::new();
        let mut entry = test_entry(company);
        let foreign = account(CompanyId::new(), codes::CASH, AccountKind::Asset);
        let cash = account(company, codes::CASH, AccountKind::Asset);

        assert!(entry.add_line(&foreign, LineDraft::debit(codes::CASH, 1, "x")).is_err());
        assert!(entry.add_line(&cash, LineDraft::debit(codes::CASH, -1, "x")).is_err());
        assert!(entry.add_line(&cash, LineDraft::debit("9999", 1, "x")).is_err());
        assert!(entry.lines().is_empty());
    }

    #[test]
    fn zero_amount_lines_keep_their_drafted_side() {
        let company = CompanyId::new();
        let mut entry = test_entry(company);
        let receivable = account(company, codes::ACCOUNTS_RECEIVABLE, AccountKind::Asset);
        let revenue = account(company, codes::SALES_REVENUE, AccountKind::Revenue);

        entry.add_line(&receivable, LineDraft::debit(codes::ACCOUNTS_RECEIVABLE, 0, "ar")).unwrap();
        entry.add_line(&revenue, LineDraft::credit(codes::SALES_REVENUE, 0, "rev")).unwrap();
        entry.post(test_time()).unwrap();

        assert_eq!(entry.lines()[0].side(), Side::Debit);
        assert_eq!(entry.lines()[0].amount(), 0);
        assert_eq!(entry.lines()[1].side(), Side::Credit);
    }

    #[test]
    fn source_tags() {
        assert_eq!(JournalSource::Expense.source_type().as_str(), "EXPENSE");
        assert_eq!(JournalSource::Expense.source_id(), None);
        let sale = SaleId::new(RecordId::new());
        assert_eq!(JournalSource::Sale(sale).source_id(), Some(*sale.0.as_uuid()));
        assert_eq!(serde_json::to_string(&SourceType::Purchase).unwrap(), "\"PURCHASE\"");
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: an entry built from matched debit/credit pairs always posts, and
        /// every line carries exactly one side.
        #[test]
        fn matched_pairs_always_post(amounts in prop::collection::vec(1i64..1_000_000i64, 1..10)) {
            let company = CompanyId::new();
            let mut entry = test_entry(company);
            let cash = account(company, codes::CASH, AccountKind::Asset);
            let payable = account(company, codes::ACCOUNTS_PAYABLE, AccountKind::Liability);

            for amount in &amounts {
                entry.add_line(&cash, LineDraft::debit(codes::CASH, *amount, "d")).unwrap();
                entry.add_line(&payable, LineDraft::credit(codes::ACCOUNTS_PAYABLE, *amount, "c")).unwrap();
            }

            prop_assert!(entry.post(test_time()).is_ok());
            for line in entry.lines() {
                prop_assert!((line.debit_amount == 0) != (line.credit_amount == 0));
            }
        }
    }
}
