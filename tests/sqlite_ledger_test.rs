//! Integration tests for the persisted defectiveness ledger.

use std::sync::Arc;

use queue_sweeper::adapters::sqlite::{create_test_pool, migrate, open_migrated_ledger};
use queue_sweeper::adapters::SqliteDefectLedger;
use queue_sweeper::domain::models::{FailureType, LedgerScope, QueueItem};
use queue_sweeper::domain::ports::DefectLedger;
use queue_sweeper::services::check_permitted_attempts;

fn scope(failure_type: FailureType) -> LedgerScope {
    LedgerScope::new("http://radarr:7878/api/v3", failure_type)
}

async fn memory_ledger() -> SqliteDefectLedger {
    let pool = create_test_pool().await.expect("Failed to create test pool");
    migrate(&pool).await.expect("Failed to run migrations");
    SqliteDefectLedger::new(pool)
}

#[tokio::test]
async fn test_increment_creates_then_counts() {
    let ledger = memory_ledger().await;
    let stalled = scope(FailureType::Stalled);

    let first = ledger.increment(&stalled, "HASH1", "Movie").await.unwrap();
    let second = ledger.increment(&stalled, "HASH1", "Movie").await.unwrap();

    assert_eq!(first.attempts, 1);
    assert_eq!(second.attempts, 2);
    assert_eq!(second.title, "Movie");
}

#[tokio::test]
async fn test_scopes_are_independent() {
    let ledger = memory_ledger().await;
    ledger.increment(&scope(FailureType::Stalled), "HASH1", "Movie").await.unwrap();

    assert!(ledger
        .get(&scope(FailureType::MetadataMissing), "HASH1")
        .await
        .unwrap()
        .is_none());
    let other_source = LedgerScope::new("http://sonarr:8989/api/v3", FailureType::Stalled);
    assert!(ledger.list(&other_source).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_returns_removed_entry() {
    let ledger = memory_ledger().await;
    let stalled = scope(FailureType::Stalled);
    ledger.increment(&stalled, "HASH1", "Movie").await.unwrap();

    let removed = ledger.delete(&stalled, "HASH1").await.unwrap();

    assert_eq!(removed.map(|e| e.attempts), Some(1));
    assert!(ledger.delete(&stalled, "HASH1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_snapshot_nests_source_then_type() {
    let ledger = memory_ledger().await;
    ledger.increment(&scope(FailureType::Stalled), "A", "Movie A").await.unwrap();
    ledger.increment(&scope(FailureType::Stalled), "B", "Movie B").await.unwrap();
    ledger.increment(&scope(FailureType::MetadataMissing), "C", "Movie C").await.unwrap();

    let snapshot = ledger.snapshot().await.unwrap();

    assert_eq!(snapshot.len(), 3);
    assert_eq!(snapshot.scope(&scope(FailureType::Stalled)).map(|s| s.len()), Some(2));
    assert_eq!(
        snapshot
            .get(&scope(FailureType::MetadataMissing), "C")
            .map(|e| e.title.as_str()),
        Some("Movie C")
    );
}

#[tokio::test]
async fn test_clear_forgets_everything() {
    let ledger = memory_ledger().await;
    ledger.increment(&scope(FailureType::Stalled), "A", "Movie A").await.unwrap();
    ledger.increment(&scope(FailureType::Stalled), "B", "Movie B").await.unwrap();

    assert_eq!(ledger.clear().await.unwrap(), 2);
    assert!(ledger.snapshot().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_migrations_apply_once() {
    let pool = create_test_pool().await.unwrap();
    assert!(migrate(&pool).await.unwrap() > 0);
    assert_eq!(migrate(&pool).await.unwrap(), 0);
}

#[tokio::test]
async fn test_counters_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.db");
    let stalled = scope(FailureType::Stalled);

    {
        let ledger = open_migrated_ledger(&path).await.unwrap();
        ledger.increment(&stalled, "HASH1", "Movie").await.unwrap();
        ledger.increment(&stalled, "HASH1", "Movie").await.unwrap();
    }

    let reopened = open_migrated_ledger(&path).await.unwrap();
    let entry = reopened.get(&stalled, "HASH1").await.unwrap().unwrap();
    assert_eq!(entry.attempts, 2);
}

#[tokio::test]
async fn test_attempts_state_machine_over_sqlite() {
    let ledger: Arc<dyn DefectLedger> = Arc::new(memory_ledger().await);
    let stalled = scope(FailureType::Stalled);
    let item = |id, download_id: &str| QueueItem::new(id, download_id, format!("Release {download_id}"), "warning");

    let outcome = check_permitted_attempts(ledger.as_ref(), &stalled, vec![item(1, "A"), item(2, "B")], 1)
        .await
        .unwrap();
    assert!(outcome.to_remove.is_empty());
    assert_eq!(outcome.spared.len(), 2);

    // B recovered, A exceeded.
    let outcome = check_permitted_attempts(ledger.as_ref(), &stalled, vec![item(1, "A")], 1)
        .await
        .unwrap();
    assert_eq!(outcome.to_remove.len(), 1);
    assert_eq!(outcome.to_remove[0].download_id, "A");
    assert_eq!(outcome.recovered.len(), 1);
    assert_eq!(outcome.recovered[0].0, "B");
    assert!(ledger.get(&stalled, "B").await.unwrap().is_none());
}
