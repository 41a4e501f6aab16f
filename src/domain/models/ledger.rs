//! Ledger records: defective-download entries and the per-run removal set.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use super::FailureType;

/// Attempt counter for one download under one (source, failure type) scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefectEntry {
    pub title: String,
    pub attempts: u32,
}

impl DefectEntry {
    /// Entry for a download observed defective for the first time.
    pub fn first_observation(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            attempts: 1,
        }
    }
}

/// Ledger partition a single evaluation reads and writes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LedgerScope {
    /// Base URL of the source application.
    pub source: String,
    pub failure_type: FailureType,
}

impl LedgerScope {
    pub fn new(source: impl Into<String>, failure_type: FailureType) -> Self {
        Self {
            source: source.into(),
            failure_type,
        }
    }
}

/// Nested ledger layout: source URL -> failure type -> download id -> entry.
///
/// This is the persisted and exported form of the defectiveness ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LedgerSnapshot(pub BTreeMap<String, BTreeMap<FailureType, BTreeMap<String, DefectEntry>>>);

impl LedgerSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries tracked under a scope, `None` when the scope was never seen.
    pub fn scope(&self, scope: &LedgerScope) -> Option<&BTreeMap<String, DefectEntry>> {
        self.0
            .get(&scope.source)
            .and_then(|by_type| by_type.get(&scope.failure_type))
    }

    pub fn get(&self, scope: &LedgerScope, download_id: &str) -> Option<&DefectEntry> {
        self.scope(scope).and_then(|entries| entries.get(download_id))
    }

    /// Return the entry for `download_id`, creating the source level, the
    /// failure-type level and the leaf as needed. A created leaf starts at
    /// zero attempts; callers increment it.
    pub fn entry_mut_or_insert(
        &mut self,
        scope: &LedgerScope,
        download_id: &str,
        title: &str,
    ) -> &mut DefectEntry {
        self.0
            .entry(scope.source.clone())
            .or_default()
            .entry(scope.failure_type)
            .or_default()
            .entry(download_id.to_string())
            .or_insert_with(|| DefectEntry {
                title: title.to_string(),
                attempts: 0,
            })
    }

    /// Remove an entry, pruning empty parent levels.
    pub fn remove(&mut self, scope: &LedgerScope, download_id: &str) -> Option<DefectEntry> {
        let by_type = self.0.get_mut(&scope.source)?;
        let entries = by_type.get_mut(&scope.failure_type)?;
        let removed = entries.remove(download_id);
        if entries.is_empty() {
            by_type.remove(&scope.failure_type);
        }
        if by_type.is_empty() {
            self.0.remove(&scope.source);
        }
        removed
    }

    /// Total number of tracked entries across all scopes.
    pub fn len(&self) -> usize {
        self.0
            .values()
            .flat_map(BTreeMap::values)
            .map(BTreeMap::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten into rows, ordered by source, failure type, download id.
    pub fn rows(&self) -> Vec<(String, FailureType, String, DefectEntry)> {
        self.0
            .iter()
            .flat_map(|(source, by_type)| {
                by_type.iter().flat_map(move |(failure_type, entries)| {
                    entries.iter().map(move |(download_id, entry)| {
                        (source.clone(), *failure_type, download_id.clone(), entry.clone())
                    })
                })
            })
            .collect()
    }
}

/// Download ids already submitted for removal during this process run.
///
/// Append-only: ids are never forgotten while the process lives.
#[derive(Debug, Clone, Default)]
pub struct DeletedDownloads {
    ids: HashSet<String>,
    order: Vec<String>,
}

impl DeletedDownloads {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, download_id: &str) -> bool {
        self.ids.contains(download_id)
    }

    /// Record an id; returns `false` when it was already present.
    pub fn record(&mut self, download_id: &str) -> bool {
        if self.ids.insert(download_id.to_string()) {
            self.order.push(download_id.to_string());
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Ids in the order they were recorded.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> LedgerScope {
        LedgerScope::new("http://radarr:7878/api/v3", FailureType::Stalled)
    }

    #[test]
    fn test_unknown_scope_is_empty() {
        let snapshot = LedgerSnapshot::new();
        assert!(snapshot.scope(&scope()).is_none());
        assert!(snapshot.get(&scope(), "ABC").is_none());
    }

    #[test]
    fn test_upsert_creates_every_level() {
        let mut snapshot = LedgerSnapshot::new();
        snapshot.entry_mut_or_insert(&scope(), "ABC", "Movie").attempts += 1;
        snapshot.entry_mut_or_insert(&scope(), "ABC", "ignored title").attempts += 1;

        let entry = snapshot.get(&scope(), "ABC").unwrap();
        assert_eq!(entry.attempts, 2);
        assert_eq!(entry.title, "Movie");
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn test_remove_prunes_empty_levels() {
        let mut snapshot = LedgerSnapshot::new();
        snapshot.entry_mut_or_insert(&scope(), "ABC", "Movie").attempts = 1;

        let removed = snapshot.remove(&scope(), "ABC");
        assert_eq!(removed.map(|e| e.attempts), Some(1));
        assert!(snapshot.0.is_empty());
        assert!(snapshot.remove(&scope(), "ABC").is_none());
    }

    #[test]
    fn test_snapshot_json_layout() {
        let mut snapshot = LedgerSnapshot::new();
        snapshot.entry_mut_or_insert(&scope(), "ABC", "Movie").attempts = 2;

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "http://radarr:7878/api/v3": {
                    "stalled": { "ABC": { "title": "Movie", "attempts": 2 } }
                }
            })
        );
    }

    #[test]
    fn test_deleted_downloads_is_append_only() {
        let mut deleted = DeletedDownloads::new();
        assert!(deleted.record("A"));
        assert!(deleted.record("B"));
        assert!(!deleted.record("A"));
        assert_eq!(deleted.len(), 2);
        assert_eq!(deleted.iter().collect::<Vec<_>>(), vec!["A", "B"]);
    }
}
