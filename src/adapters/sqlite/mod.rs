//! SQLite adapters for the queue sweeper.

pub mod connection;
pub mod defect_ledger;
pub mod migrations;

pub use connection::{create_test_pool, open_ledger_pool, ConnectionError};
pub use defect_ledger::SqliteDefectLedger;
pub use migrations::{all_embedded_migrations, Migration, MigrationError, Migrator};

use sqlx::SqlitePool;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),
    #[error("Migration error: {0}")]
    Migration(#[from] MigrationError),
}

/// Open the ledger database at `path` and bring its schema up to date.
pub async fn open_migrated_ledger(path: impl AsRef<Path>) -> Result<SqliteDefectLedger, DatabaseError> {
    let pool = open_ledger_pool(path).await?;
    migrate(&pool).await?;
    Ok(SqliteDefectLedger::new(pool))
}

/// Apply the embedded migrations to `pool`.
pub async fn migrate(pool: &SqlitePool) -> Result<usize, DatabaseError> {
    Ok(Migrator::new(pool.clone()).run(all_embedded_migrations()).await?)
}
