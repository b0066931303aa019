//! Accounting module: chart of accounts, journal entries and the posting engine
//! that turns sales, purchases and expenses into balanced entries.
//!
//! Persistence is abstracted behind [`LedgerStore`]; every posting runs inside a
//! single [`LedgerTransaction`] and leaves nothing behind on failure.

pub mod account;
pub mod entry;
pub mod numbering;
pub mod posting;
pub mod recipes;
pub mod store;

pub use account::{AccountId, AccountKind, ChartOfAccount, codes, standard_accounts};
pub use entry::{
    JournalEntry, JournalEntryId, JournalEntryLine, JournalSource, LineDraft, NewJournalEntry,
    Side, SourceType,
};
pub use numbering::{EntryNumber, EntryPeriod};
pub use posting::{
    JournalPostingEngine, PostingContext, PostingError, generate_entry_number, resolve_account,
};
pub use recipes::{ExpenseInput, PostingRecipe};
pub use store::{LedgerStore, LedgerStoreError, LedgerTransaction};
