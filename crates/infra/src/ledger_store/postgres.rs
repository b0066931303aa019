//! Postgres-backed chart of accounts and journal.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | LedgerStoreError |
//! |------------|----------------------|------------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (other) | Any other | `Backend` |
//! | PoolClosed / PoolTimedOut / Io | N/A | `Unavailable` |
//! | Other | N/A | `Backend` |
//!
//! ## Numbering
//!
//! `last_entry_sequence` takes `pg_advisory_xact_lock(hashtext(company || prefix))`
//! before scanning, so concurrent postings for the same company and month queue
//! behind each other until commit or rollback. The unique
//! `(company_id, entry_number)` constraint catches anything that bypasses the lock.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;
use uuid::Uuid;

use stockbook_accounting::{
    AccountId, AccountKind, ChartOfAccount, EntryPeriod, JournalEntry, JournalEntryId,
    JournalEntryLine, LedgerStore, LedgerStoreError, LedgerTransaction,
};
use stockbook_core::{CompanyId, RecordId};

use crate::db::{self, SqlFailure, classify_sqlx_error};

#[derive(Debug, Clone)]
pub struct PostgresLedgerStore {
    pool: Arc<PgPool>,
}

impl PostgresLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

impl LedgerStore for PostgresLedgerStore {
    type Tx<'a> = PostgresLedgerTx;

    fn begin(&self) -> Result<Self::Tx<'_>, LedgerStoreError> {
        let tx = db::block_on(
            async {
                self.pool
                    .begin()
                    .await
                    .map_err(|e| map_sqlx_error("begin", e))
            },
            LedgerStoreError::Unavailable,
        )?;
        Ok(PostgresLedgerTx { tx })
    }
}

/// Open database transaction. Dropping it without `commit` rolls back.
pub struct PostgresLedgerTx {
    tx: Transaction<'static, Postgres>,
}

impl PostgresLedgerTx {
    #[instrument(skip(self), fields(company_id = %company_id), err)]
    async fn find_account(
        &mut self,
        company_id: CompanyId,
        code: &str,
    ) -> Result<Option<ChartOfAccount>, LedgerStoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, company_id, code, name, kind, is_active
            FROM chart_of_accounts
            WHERE company_id = $1 AND code = $2 AND is_active
            LIMIT 1
            "#,
        )
        .bind(company_id.as_uuid())
        .bind(code)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("find_active_account", e))?;

        row.as_ref().map(account_from_row).transpose()
    }

    #[instrument(skip(self), fields(company_id = %company_id, prefix = %period.prefix()), err)]
    async fn lock_and_scan(
        &mut self,
        company_id: CompanyId,
        period: EntryPeriod,
    ) -> Result<Option<u32>, LedgerStoreError> {
        let prefix = period.prefix();

        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(format!("{}{}", company_id, prefix))
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("lock_entry_numbers", e))?;

        let last: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT MAX(CAST(SUBSTRING(entry_number FROM LENGTH($2) + 1) AS BIGINT))
            FROM journal_entries
            WHERE company_id = $1
              AND entry_number LIKE $2 || '%'
              AND SUBSTRING(entry_number FROM LENGTH($2) + 1) ~ '^[0-9]+$'
            "#,
        )
        .bind(company_id.as_uuid())
        .bind(&prefix)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("last_entry_sequence", e))?;

        last.map(|n| {
            u32::try_from(n).map_err(|_| {
                LedgerStoreError::Backend(format!("entry sequence {n} out of range for {prefix}"))
            })
        })
        .transpose()
    }

    #[instrument(skip(self, entry), fields(entry_number = %entry.entry_number()), err)]
    async fn insert_header(&mut self, entry: &JournalEntry) -> Result<(), LedgerStoreError> {
        sqlx::query(
            r#"
            INSERT INTO journal_entries (
                id, entry_number, entry_date, reference, description,
                source_type, source_id, company_id, created_by, posted_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NULL)
            "#,
        )
        .bind(entry.id_typed().0.as_uuid())
        .bind(entry.entry_number().to_string())
        .bind(entry.entry_date())
        .bind(entry.reference())
        .bind(entry.description())
        .bind(entry.source().source_type().as_str())
        .bind(entry.source().source_id())
        .bind(entry.company_id().as_uuid())
        .bind(entry.created_by().as_uuid())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_entry", e))?;

        Ok(())
    }

    #[instrument(skip(self, line), fields(entry_id = %entry_id, line_number = line.line_number), err)]
    async fn insert_line_row(
        &mut self,
        entry_id: JournalEntryId,
        line: &JournalEntryLine,
    ) -> Result<(), LedgerStoreError> {
        let line_number = i32::try_from(line.line_number)
            .map_err(|_| LedgerStoreError::Backend("line number out of range".to_string()))?;
        let party_id: Option<Uuid> = line.party.as_ref().map(|p| *p.party_id.0.as_uuid());
        let party_type: Option<&str> = line.party.as_ref().map(|p| p.kind.as_str());

        sqlx::query(
            r#"
            INSERT INTO journal_entry_lines (
                journal_entry_id, line_number, coa_id, description,
                debit_amount, credit_amount, party_id, party_type
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(entry_id.0.as_uuid())
        .bind(line_number)
        .bind(line.account_id.0.as_uuid())
        .bind(&line.description)
        .bind(line.debit_amount)
        .bind(line.credit_amount)
        .bind(party_id)
        .bind(party_type)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_line", e))?;

        Ok(())
    }

    #[instrument(skip(self), fields(entry_id = %entry_id), err)]
    async fn set_posted(
        &mut self,
        entry_id: JournalEntryId,
        posted_at: DateTime<Utc>,
    ) -> Result<(), LedgerStoreError> {
        let result = sqlx::query("UPDATE journal_entries SET posted_at = $2 WHERE id = $1")
            .bind(entry_id.0.as_uuid())
            .bind(posted_at)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("mark_posted", e))?;

        if result.rows_affected() != 1 {
            return Err(LedgerStoreError::Backend(format!(
                "journal entry {entry_id} not found when marking posted"
            )));
        }
        Ok(())
    }
}

impl LedgerTransaction for PostgresLedgerTx {
    fn find_active_account(
        &mut self,
        company_id: CompanyId,
        code: &str,
    ) -> Result<Option<ChartOfAccount>, LedgerStoreError> {
        db::block_on(self.find_account(company_id, code), LedgerStoreError::Unavailable)
    }

    fn last_entry_sequence(
        &mut self,
        company_id: CompanyId,
        period: EntryPeriod,
    ) -> Result<Option<u32>, LedgerStoreError> {
        db::block_on(self.lock_and_scan(company_id, period), LedgerStoreError::Unavailable)
    }

    fn insert_entry(&mut self, entry: &JournalEntry) -> Result<(), LedgerStoreError> {
        db::block_on(self.insert_header(entry), LedgerStoreError::Unavailable)
    }

    fn insert_line(
        &mut self,
        entry_id: JournalEntryId,
        line: &JournalEntryLine,
    ) -> Result<(), LedgerStoreError> {
        db::block_on(self.insert_line_row(entry_id, line), LedgerStoreError::Unavailable)
    }

    fn mark_posted(
        &mut self,
        entry_id: JournalEntryId,
        posted_at: DateTime<Utc>,
    ) -> Result<(), LedgerStoreError> {
        db::block_on(self.set_posted(entry_id, posted_at), LedgerStoreError::Unavailable)
    }

    fn commit(self) -> Result<(), LedgerStoreError> {
        db::block_on(
            async move { self.tx.commit().await.map_err(|e| map_sqlx_error("commit", e)) },
            LedgerStoreError::Unavailable,
        )
    }
}

fn account_from_row(row: &PgRow) -> Result<ChartOfAccount, LedgerStoreError> {
    let decode =
        |e: sqlx::Error| LedgerStoreError::Backend(format!("failed to decode account row: {e}"));

    let id: Uuid = row.try_get("id").map_err(decode)?;
    let company_id: Uuid = row.try_get("company_id").map_err(decode)?;
    let kind: String = row.try_get("kind").map_err(decode)?;

    Ok(ChartOfAccount {
        id: AccountId::new(RecordId::from_uuid(id)),
        company_id: CompanyId::from_uuid(company_id),
        code: row.try_get("code").map_err(decode)?,
        name: row.try_get("name").map_err(decode)?,
        kind: AccountKind::parse(&kind)
            .ok_or_else(|| LedgerStoreError::Backend(format!("unknown account kind {kind:?}")))?,
        is_active: row.try_get("is_active").map_err(decode)?,
    })
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> LedgerStoreError {
    match classify_sqlx_error(operation, err) {
        SqlFailure::UniqueViolation(msg) => LedgerStoreError::Conflict(msg),
        SqlFailure::Unavailable(msg) => LedgerStoreError::Unavailable(msg),
        SqlFailure::Other(msg) => LedgerStoreError::Backend(msg),
    }
}
