use chrono::{DateTime, Utc};
use thiserror::Error;

use stockbook_core::CompanyId;

use crate::account::ChartOfAccount;
use crate::entry::{JournalEntry, JournalEntryId, JournalEntryLine};
use crate::numbering::EntryPeriod;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerStoreError {
    #[error("ledger store unavailable: {0}")]
    Unavailable(String),

    /// Uniqueness violation, e.g. a duplicate entry number.
    #[error("ledger conflict: {0}")]
    Conflict(String),

    #[error("ledger store backend error: {0}")]
    Backend(String),
}

/// One unit of work against the ledger.
///
/// Dropping a transaction without calling [`LedgerTransaction::commit`] discards
/// every write made through it.
pub trait LedgerTransaction {
    /// Active account with `code` in the company's chart, if any.
    fn find_active_account(
        &mut self,
        company_id: CompanyId,
        code: &str,
    ) -> Result<Option<ChartOfAccount>, LedgerStoreError>;

    /// Highest sequence already used by the company in `period`.
    ///
    /// Implementations must serialize numbering per (company, period) for the
    /// rest of the transaction so that two postings never pick the same number.
    fn last_entry_sequence(
        &mut self,
        company_id: CompanyId,
        period: EntryPeriod,
    ) -> Result<Option<u32>, LedgerStoreError>;

    /// Insert the entry header (unposted).
    fn insert_entry(&mut self, entry: &JournalEntry) -> Result<(), LedgerStoreError>;

    fn insert_line(
        &mut self,
        entry_id: JournalEntryId,
        line: &JournalEntryLine,
    ) -> Result<(), LedgerStoreError>;

    fn mark_posted(
        &mut self,
        entry_id: JournalEntryId,
        posted_at: DateTime<Utc>,
    ) -> Result<(), LedgerStoreError>;

    fn commit(self) -> Result<(), LedgerStoreError>
    where
        Self: Sized;
}

/// Transactional journal storage.
pub trait LedgerStore: Send + Sync {
    type Tx<'a>: LedgerTransaction
    where
        Self: 'a;

    fn begin(&self) -> Result<Self::Tx<'_>, LedgerStoreError>;
}
