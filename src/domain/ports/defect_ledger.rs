use async_trait::async_trait;

use crate::domain::errors::LedgerResult;
use crate::domain::models::{DefectEntry, LedgerScope, LedgerSnapshot};

/// Storage port for the defectiveness ledger.
///
/// Scopes never written to behave as empty. Implementations are internally
/// synchronized, but callers must not evaluate the same scope concurrently:
/// the recovery and attempt passes read then write without a transaction.
#[async_trait]
pub trait DefectLedger: Send + Sync {
    /// Get the entry of one download, `None` when untracked
    async fn get(&self, scope: &LedgerScope, download_id: &str) -> LedgerResult<Option<DefectEntry>>;

    /// Add one attempt, creating the entry with `attempts = 1` when untracked.
    /// Returns the entry after the update.
    async fn increment(
        &self,
        scope: &LedgerScope,
        download_id: &str,
        title: &str,
    ) -> LedgerResult<DefectEntry>;

    /// Delete an entry, returning it if it existed
    async fn delete(&self, scope: &LedgerScope, download_id: &str) -> LedgerResult<Option<DefectEntry>>;

    /// All entries tracked under a scope, ordered by download id
    async fn list(&self, scope: &LedgerScope) -> LedgerResult<Vec<(String, DefectEntry)>>;

    /// The whole ledger in its nested layout
    async fn snapshot(&self) -> LedgerResult<LedgerSnapshot>;

    /// Forget every entry; returns how many were removed
    async fn clear(&self) -> LedgerResult<u64>;
}
