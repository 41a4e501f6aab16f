//! SQLite implementation of the DefectLedger port.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::domain::errors::{LedgerError, LedgerResult};
use crate::domain::models::{DefectEntry, FailureType, LedgerScope, LedgerSnapshot};
use crate::domain::ports::DefectLedger;

/// Ledger persisted in SQLite so attempt counters survive restarts.
#[derive(Clone)]
pub struct SqliteDefectLedger {
    pool: SqlitePool,
}

impl SqliteDefectLedger {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct EntryRow {
    download_id: String,
    title: String,
    attempts: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct SnapshotRow {
    source: String,
    failure_type: String,
    download_id: String,
    title: String,
    attempts: i64,
}

fn to_attempts(value: i64) -> LedgerResult<u32> {
    u32::try_from(value).map_err(|_| LedgerError::InvalidAttempts(value))
}

fn row_to_entry(row: EntryRow) -> LedgerResult<(String, DefectEntry)> {
    Ok((
        row.download_id,
        DefectEntry {
            title: row.title,
            attempts: to_attempts(row.attempts)?,
        },
    ))
}

#[async_trait]
impl DefectLedger for SqliteDefectLedger {
    async fn get(&self, scope: &LedgerScope, download_id: &str) -> LedgerResult<Option<DefectEntry>> {
        let row: Option<EntryRow> = sqlx::query_as(
            "SELECT download_id, title, attempts FROM defect_ledger
             WHERE source = ? AND failure_type = ? AND download_id = ?",
        )
        .bind(&scope.source)
        .bind(scope.failure_type.as_str())
        .bind(download_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_entry)
            .transpose()
            .map(|entry| entry.map(|(_, e)| e))
    }

    async fn increment(
        &self,
        scope: &LedgerScope,
        download_id: &str,
        title: &str,
    ) -> LedgerResult<DefectEntry> {
        let now = Utc::now().to_rfc3339();
        let row: EntryRow = sqlx::query_as(
            "INSERT INTO defect_ledger
                (source, failure_type, download_id, title, attempts, first_seen_at, last_seen_at)
             VALUES (?, ?, ?, ?, 1, ?, ?)
             ON CONFLICT (source, failure_type, download_id)
             DO UPDATE SET attempts = attempts + 1, last_seen_at = excluded.last_seen_at
             RETURNING download_id, title, attempts",
        )
        .bind(&scope.source)
        .bind(scope.failure_type.as_str())
        .bind(download_id)
        .bind(title)
        .bind(&now)
        .bind(&now)
        .fetch_one(&self.pool)
        .await?;

        row_to_entry(row).map(|(_, entry)| entry)
    }

    async fn delete(&self, scope: &LedgerScope, download_id: &str) -> LedgerResult<Option<DefectEntry>> {
        let row: Option<EntryRow> = sqlx::query_as(
            "DELETE FROM defect_ledger
             WHERE source = ? AND failure_type = ? AND download_id = ?
             RETURNING download_id, title, attempts",
        )
        .bind(&scope.source)
        .bind(scope.failure_type.as_str())
        .bind(download_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_entry)
            .transpose()
            .map(|entry| entry.map(|(_, e)| e))
    }

    async fn list(&self, scope: &LedgerScope) -> LedgerResult<Vec<(String, DefectEntry)>> {
        let rows: Vec<EntryRow> = sqlx::query_as(
            "SELECT download_id, title, attempts FROM defect_ledger
             WHERE source = ? AND failure_type = ?
             ORDER BY download_id",
        )
        .bind(&scope.source)
        .bind(scope.failure_type.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_entry).collect()
    }

    async fn snapshot(&self) -> LedgerResult<LedgerSnapshot> {
        let rows: Vec<SnapshotRow> = sqlx::query_as(
            "SELECT source, failure_type, download_id, title, attempts FROM defect_ledger",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut snapshot = LedgerSnapshot::new();
        for row in rows {
            let failure_type: FailureType = row
                .failure_type
                .parse()
                .map_err(|_| LedgerError::UnknownFailureType(row.failure_type.clone()))?;
            let scope = LedgerScope::new(row.source, failure_type);
            snapshot
                .entry_mut_or_insert(&scope, &row.download_id, &row.title)
                .attempts = to_attempts(row.attempts)?;
        }
        Ok(snapshot)
    }

    async fn clear(&self) -> LedgerResult<u64> {
        let result = sqlx::query("DELETE FROM defect_ledger")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
