use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use stockbook_accounting::{
    ChartOfAccount, EntryPeriod, JournalEntry, JournalEntryId, JournalEntryLine, LedgerStore,
    LedgerStoreError, LedgerTransaction, standard_accounts,
};
use stockbook_core::CompanyId;

#[derive(Debug, Clone)]
struct StoredEntry {
    header: JournalEntry,
    lines: Vec<JournalEntryLine>,
    posted_at: Option<DateTime<Utc>>,
}

impl StoredEntry {
    fn to_entry(&self) -> JournalEntry {
        JournalEntry::restore(self.header.header(), self.lines.clone(), self.posted_at)
    }
}

#[derive(Debug, Default)]
struct LedgerTables {
    accounts: Vec<ChartOfAccount>,
    entries: Vec<StoredEntry>,
}

/// In-memory chart of accounts and journal.
///
/// Intended for tests/dev. A transaction holds the table mutex until it is
/// committed or dropped, which serializes entry numbering across threads. Writes
/// are staged in the transaction and only reach the tables on commit.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    tables: Mutex<LedgerTables>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, LedgerTables>, LedgerStoreError> {
        self.tables
            .lock()
            .map_err(|_| LedgerStoreError::Unavailable("ledger lock poisoned".to_string()))
    }

    pub fn add_account(&self, account: ChartOfAccount) -> Result<(), LedgerStoreError> {
        let mut tables = self.lock()?;
        if tables
            .accounts
            .iter()
            .any(|a| a.company_id == account.company_id && a.code == account.code)
        {
            return Err(LedgerStoreError::Conflict(format!(
                "account {} already exists for company {}",
                account.code, account.company_id
            )));
        }
        tables.accounts.push(account);
        Ok(())
    }

    /// Give `company_id` the six accounts every posting recipe needs.
    pub fn provision_standard_chart(&self, company_id: CompanyId) -> Result<(), LedgerStoreError> {
        for account in standard_accounts(company_id) {
            self.add_account(account)?;
        }
        Ok(())
    }

    pub fn set_account_active(
        &self,
        company_id: CompanyId,
        code: &str,
        is_active: bool,
    ) -> Result<(), LedgerStoreError> {
        let mut tables = self.lock()?;
        for account in tables
            .accounts
            .iter_mut()
            .filter(|a| a.company_id == company_id && a.code == code)
        {
            account.is_active = is_active;
        }
        Ok(())
    }

    /// Committed entries of a company, in entry-number order.
    pub fn entries(&self, company_id: CompanyId) -> Vec<JournalEntry> {
        let tables = match self.lock() {
            Ok(t) => t,
            Err(_) => return vec![],
        };
        let mut entries: Vec<JournalEntry> = tables
            .entries
            .iter()
            .filter(|e| e.header.company_id() == company_id)
            .map(StoredEntry::to_entry)
            .collect();
        entries.sort_by_key(|e| e.entry_number());
        entries
    }

    pub fn entry_count(&self) -> usize {
        self.lock().map(|t| t.entries.len()).unwrap_or(0)
    }
}

pub struct InMemoryLedgerTx<'a> {
    tables: MutexGuard<'a, LedgerTables>,
    staged: Vec<StoredEntry>,
}

impl InMemoryLedgerTx<'_> {
    fn staged_mut(&mut self, entry_id: JournalEntryId) -> Result<&mut StoredEntry, LedgerStoreError> {
        self.staged
            .iter_mut()
            .find(|e| e.header.id_typed() == entry_id)
            .ok_or_else(|| {
                LedgerStoreError::Backend(format!("entry {entry_id} was not inserted in this transaction"))
            })
    }
}

impl LedgerTransaction for InMemoryLedgerTx<'_> {
    fn find_active_account(
        &mut self,
        company_id: CompanyId,
        code: &str,
    ) -> Result<Option<ChartOfAccount>, LedgerStoreError> {
        Ok(self
            .tables
            .accounts
            .iter()
            .find(|a| a.company_id == company_id && a.code == code && a.is_active)
            .cloned())
    }

    fn last_entry_sequence(
        &mut self,
        company_id: CompanyId,
        period: EntryPeriod,
    ) -> Result<Option<u32>, LedgerStoreError> {
        Ok(self
            .tables
            .entries
            .iter()
            .chain(self.staged.iter())
            .map(|e| &e.header)
            .filter(|e| e.company_id() == company_id && e.entry_number().period() == period)
            .map(|e| e.entry_number().sequence())
            .max())
    }

    fn insert_entry(&mut self, entry: &JournalEntry) -> Result<(), LedgerStoreError> {
        let taken = self
            .tables
            .entries
            .iter()
            .chain(self.staged.iter())
            .any(|e| {
                e.header.company_id() == entry.company_id()
                    && e.header.entry_number() == entry.entry_number()
            });
        if taken {
            return Err(LedgerStoreError::Conflict(format!(
                "entry number {} already used by company {}",
                entry.entry_number(),
                entry.company_id()
            )));
        }

        self.staged.push(StoredEntry {
            header: JournalEntry::new(entry.header()),
            lines: Vec::new(),
            posted_at: None,
        });
        Ok(())
    }

    fn insert_line(
        &mut self,
        entry_id: JournalEntryId,
        line: &JournalEntryLine,
    ) -> Result<(), LedgerStoreError> {
        self.staged_mut(entry_id)?.lines.push(line.clone());
        Ok(())
    }

    fn mark_posted(
        &mut self,
        entry_id: JournalEntryId,
        posted_at: DateTime<Utc>,
    ) -> Result<(), LedgerStoreError> {
        self.staged_mut(entry_id)?.posted_at = Some(posted_at);
        Ok(())
    }

    fn commit(mut self) -> Result<(), LedgerStoreError> {
        let staged = std::mem::take(&mut self.staged);
        self.tables.entries.extend(staged);
        Ok(())
    }
}

impl LedgerStore for InMemoryLedgerStore {
    type Tx<'a> = InMemoryLedgerTx<'a>;

    fn begin(&self) -> Result<Self::Tx<'_>, LedgerStoreError> {
        Ok(InMemoryLedgerTx {
            tables: self.lock()?,
            staged: Vec::new(),
        })
    }
}
