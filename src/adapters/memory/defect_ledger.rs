//! Process-lifetime defectiveness ledger.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::errors::LedgerResult;
use crate::domain::models::{DefectEntry, LedgerScope, LedgerSnapshot};
use crate::domain::ports::DefectLedger;

/// Ledger held in memory for the life of the process.
#[derive(Debug, Default)]
pub struct InMemoryDefectLedger {
    entries: RwLock<LedgerSnapshot>,
}

impl InMemoryDefectLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DefectLedger for InMemoryDefectLedger {
    async fn get(&self, scope: &LedgerScope, download_id: &str) -> LedgerResult<Option<DefectEntry>> {
        let entries = self.entries.read().await;
        Ok(entries.get(scope, download_id).cloned())
    }

    async fn increment(
        &self,
        scope: &LedgerScope,
        download_id: &str,
        title: &str,
    ) -> LedgerResult<DefectEntry> {
        let mut entries = self.entries.write().await;
        let entry = entries.entry_mut_or_insert(scope, download_id, title);
        entry.attempts = entry.attempts.saturating_add(1);
        Ok(entry.clone())
    }

    async fn delete(&self, scope: &LedgerScope, download_id: &str) -> LedgerResult<Option<DefectEntry>> {
        let mut entries = self.entries.write().await;
        Ok(entries.remove(scope, download_id))
    }

    async fn list(&self, scope: &LedgerScope) -> LedgerResult<Vec<(String, DefectEntry)>> {
        let entries = self.entries.read().await;
        Ok(entries
            .scope(scope)
            .map(|tracked| {
                tracked
                    .iter()
                    .map(|(id, entry)| (id.clone(), entry.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn snapshot(&self) -> LedgerResult<LedgerSnapshot> {
        Ok(self.entries.read().await.clone())
    }

    async fn clear(&self) -> LedgerResult<u64> {
        let mut entries = self.entries.write().await;
        let removed = entries.len() as u64;
        *entries = LedgerSnapshot::new();
        Ok(removed)
    }
}
