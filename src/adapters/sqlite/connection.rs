//! SQLite connection pool for the persisted ledger.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Invalid database URL: {0}")]
    InvalidDatabaseUrl(String),
    #[error("Failed to open ledger database: {0}")]
    PoolCreationFailed(#[source] sqlx::Error),
    #[error("Failed to create directory for {path}: {source}")]
    DirectoryCreationFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Open (creating if missing) the ledger database at `path`.
///
/// The engine mutates the ledger from a single task, so one connection is enough.
pub async fn open_ledger_pool(path: impl AsRef<Path>) -> Result<SqlitePool, ConnectionError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|source| {
                ConnectionError::DirectoryCreationFailed {
                    path: path.display().to_string(),
                    source,
                }
            })?;
        }
    }

    let connect_options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(30));

    SqlitePoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(3))
        .connect_with(connect_options)
        .await
        .map_err(ConnectionError::PoolCreationFailed)
}

const MEMORY_URL: &str = "sqlite::memory:";

/// In-memory database for tests.
///
/// The database lives as long as the pool's single connection, so the
/// connection is never recycled.
pub async fn create_test_pool() -> Result<SqlitePool, ConnectionError> {
    let connect_options = SqliteConnectOptions::from_str(MEMORY_URL)
        .map_err(|_| ConnectionError::InvalidDatabaseUrl(MEMORY_URL.to_string()))?;

    SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(connect_options)
        .await
        .map_err(ConnectionError::PoolCreationFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_pools_do_not_share_state() {
        let first = create_test_pool().await.unwrap();
        let second = create_test_pool().await.unwrap();

        sqlx::query("CREATE TABLE marker (id INTEGER)")
            .execute(&first)
            .await
            .unwrap();

        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM sqlite_master WHERE name = 'marker'")
                .fetch_one(&second)
                .await
                .unwrap();
        assert_eq!(count, 0);
    }
}
