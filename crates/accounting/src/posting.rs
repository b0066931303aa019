//! Journal posting engine.
//!
//! Each `post_from_*` call runs one ledger transaction: resolve every account the
//! recipe needs, pick the next entry number for the entry date's month, insert the
//! header and its lines, check the balance, mark the entry posted and commit. Any
//! error returns before `commit`, so the transaction is dropped and rolled back.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info};

use stockbook_core::{CompanyId, DomainError, RecordId, UserId};
use stockbook_purchasing::Purchase;
use stockbook_sales::Sale;

use crate::account::ChartOfAccount;
use crate::entry::{JournalEntry, JournalEntryId, NewJournalEntry};
use crate::numbering::{EntryNumber, EntryPeriod};
use crate::recipes::{self, ExpenseInput, PostingRecipe};
use crate::store::{LedgerStore, LedgerStoreError, LedgerTransaction};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PostingError {
    #[error("account {code} is missing or inactive for company {company_id}")]
    AccountNotFound { company_id: CompanyId, code: String },

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] LedgerStoreError),
}

/// Who posts, and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostingContext {
    pub actor: UserId,
    pub posted_at: DateTime<Utc>,
}

impl PostingContext {
    pub fn new(actor: UserId, posted_at: DateTime<Utc>) -> Self {
        Self { actor, posted_at }
    }

    pub fn now(actor: UserId) -> Self {
        Self::new(actor, Utc::now())
    }
}

/// Look up an active account by code, failing with `AccountNotFound`.
pub fn resolve_account<T>(
    tx: &mut T,
    company_id: CompanyId,
    code: &str,
) -> Result<ChartOfAccount, PostingError>
where
    T: LedgerTransaction + ?Sized,
{
    match tx.find_active_account(company_id, code)? {
        Some(account) if account.is_active && account.company_id == company_id => Ok(account),
        _ => Err(PostingError::AccountNotFound {
            company_id,
            code: code.to_string(),
        }),
    }
}

/// Next number in the company's sequence for `period`.
pub fn generate_entry_number<T>(
    tx: &mut T,
    company_id: CompanyId,
    period: EntryPeriod,
) -> Result<EntryNumber, PostingError>
where
    T: LedgerTransaction + ?Sized,
{
    let last = tx.last_entry_sequence(company_id, period)?;
    Ok(EntryNumber::next(period, last)?)
}

pub struct JournalPostingEngine<L> {
    store: L,
}

impl<L> JournalPostingEngine<L>
where
    L: LedgerStore,
{
    pub fn new(store: L) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &L {
        &self.store
    }

    pub fn post_from_sale(
        &self,
        sale: &Sale,
        ctx: &PostingContext,
    ) -> Result<JournalEntry, PostingError> {
        self.post(recipes::for_sale(sale), ctx)
    }

    pub fn post_from_purchase(
        &self,
        purchase: &Purchase,
        ctx: &PostingContext,
    ) -> Result<JournalEntry, PostingError> {
        self.post(recipes::for_purchase(purchase), ctx)
    }

    pub fn post_from_expense(
        &self,
        input: &ExpenseInput,
        ctx: &PostingContext,
    ) -> Result<JournalEntry, PostingError> {
        let recipe = recipes::for_expense(input)?;
        self.post(recipe, ctx)
    }

    fn post(&self, recipe: PostingRecipe, ctx: &PostingContext) -> Result<JournalEntry, PostingError> {
        let company_id = recipe.company_id;
        let mut tx = self.store.begin()?;

        let accounts = recipe
            .accounts
            .iter()
            .map(|code| resolve_account(&mut tx, company_id, code))
            .collect::<Result<Vec<_>, _>>()?;

        let entry_number =
            generate_entry_number(&mut tx, company_id, EntryPeriod::of(recipe.entry_date))?;

        let mut entry = JournalEntry::new(NewJournalEntry {
            id: JournalEntryId::new(RecordId::new()),
            company_id,
            entry_number,
            entry_date: recipe.entry_date,
            reference: recipe.reference,
            description: recipe.description,
            source: recipe.source,
            created_by: ctx.actor,
        });
        tx.insert_entry(&entry)?;

        let entry_id = entry.id_typed();
        for draft in recipe.lines {
            let account = accounts
                .iter()
                .find(|a| a.code == draft.account_code)
                .ok_or_else(|| PostingError::AccountNotFound {
                    company_id,
                    code: draft.account_code.clone(),
                })?;
            let line = entry.add_line(account, draft)?;
            tx.insert_line(entry_id, line)?;
        }

        entry.post(ctx.posted_at)?;
        tx.mark_posted(entry_id, ctx.posted_at)?;
        tx.commit()?;

        debug!(entry_id = %entry_id, "journal transaction committed");
        info!(
            entry_number = %entry.entry_number(),
            company_id = %company_id,
            source_type = entry.source().source_type().as_str(),
            lines = entry.lines().len(),
            "journal entry posted"
        );

        Ok(entry)
    }
}
