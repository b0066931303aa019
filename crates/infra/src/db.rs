//! Database connection pool wiring.

use anyhow::Context;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::config::InfraConfig;

/// Open a Postgres pool from `config`.
pub async fn connect(config: &InfraConfig) -> anyhow::Result<PgPool> {
    let url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL is not set")?;

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(url)
        .await
        .context("failed to connect to Postgres")?;

    info!(max_connections = config.db_max_connections, "postgres pool ready");
    Ok(pool)
}

/// Run `fut` to completion from synchronous code on the current tokio runtime.
///
/// Must be called from a thread that is not driving async tasks (e.g. inside
/// `spawn_blocking` or a plain thread holding a runtime guard).
pub(crate) fn block_on<F, T, E>(fut: F, unavailable: impl FnOnce(String) -> E) -> Result<T, E>
where
    F: std::future::Future<Output = Result<T, E>>,
{
    let handle = tokio::runtime::Handle::try_current().map_err(|_| {
        unavailable(
            "postgres adapters require a tokio runtime; call from within a runtime context"
                .to_string(),
        )
    })?;
    handle.block_on(fut)
}

/// Coarse classification of a sqlx failure, mapped by each adapter onto its own
/// error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SqlFailure {
    /// `23505` unique violation.
    UniqueViolation(String),
    /// Pool closed or connection-level failure.
    Unavailable(String),
    Other(String),
}

pub(crate) fn classify_sqlx_error(operation: &str, err: sqlx::Error) -> SqlFailure {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => SqlFailure::UniqueViolation(msg),
                _ => SqlFailure::Other(msg),
            }
        }
        sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut => {
            SqlFailure::Unavailable(format!("connection pool unavailable in {}", operation))
        }
        sqlx::Error::Io(e) => SqlFailure::Unavailable(format!("io error in {}: {}", operation, e)),
        other => SqlFailure::Other(format!("sqlx error in {}: {}", operation, other)),
    }
}
