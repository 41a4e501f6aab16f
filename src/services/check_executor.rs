//! Evaluation of one (source, failure type) pair.
//!
//! The pipeline is dedup, private-tracker filter, protected-download filter,
//! permitted-attempts accounting and finally removal of the survivors. Each
//! step is toggled by the failure type's [`CheckOptions`].

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::domain::errors::{EvaluationError, EvaluationStage};
use crate::domain::models::{
    CheckOptions, DeletedDownloads, EvaluationContext, EvaluationReport, ExemptionSets,
    FeatureSettings, LedgerScope, QueueItem,
};
use crate::domain::ports::DefectLedger;
use crate::services::exemption_filters::{private_tracker_filter, protected_download_filter};
use crate::services::permitted_attempts::check_permitted_attempts;
use crate::services::queue_normalizer::{dedup_by_download_id, summarize_queue};
use crate::services::removal_service::{RemovalFlags, RemovalService};

/// Runs the check pipeline against a shared defectiveness ledger.
#[derive(Clone)]
pub struct CheckExecutor {
    ledger: Arc<dyn DefectLedger>,
    remover: RemovalService,
    permitted_attempts: u32,
    ignore_private_trackers: bool,
}

impl CheckExecutor {
    pub fn new(ledger: Arc<dyn DefectLedger>, remover: RemovalService, settings: &FeatureSettings) -> Self {
        Self {
            ledger,
            remover,
            permitted_attempts: settings.permitted_attempts,
            ignore_private_trackers: settings.ignore_private_trackers,
        }
    }

    /// Evaluate `affected` and remove what survives the enabled checks.
    ///
    /// Ledger failures abort the evaluation; removal failures do not.
    pub async fn execute_checks(
        &self,
        ctx: &EvaluationContext<'_>,
        affected: Vec<QueueItem>,
        deleted: &mut DeletedDownloads,
    ) -> Result<EvaluationReport, EvaluationError> {
        self.execute_tracked(ctx, affected, deleted, &StageTracker::default())
            .await
    }

    async fn execute_tracked(
        &self,
        ctx: &EvaluationContext<'_>,
        affected: Vec<QueueItem>,
        deleted: &mut DeletedDownloads,
        stage: &StageTracker,
    ) -> Result<EvaluationReport, EvaluationError> {
        let checks = ctx.checks;
        let mut report = EvaluationReport::default();

        stage.enter(EvaluationStage::Dedup);
        let mut survivors = dedup_by_download_id(affected);

        if checks.private_tracker_check {
            stage.enter(EvaluationStage::PrivateTrackerFilter);
            survivors = private_tracker_filter(survivors, ctx.exemptions, self.ignore_private_trackers);
        }
        if checks.protected_download_check {
            stage.enter(EvaluationStage::ProtectedDownloadFilter);
            survivors = protected_download_filter(survivors, ctx.exemptions, ctx.failure_type);
        }
        if checks.permitted_attempts_check {
            stage.enter(EvaluationStage::PermittedAttempts);
            let scope = LedgerScope::new(ctx.source.base_url.clone(), ctx.failure_type);
            let outcome = check_permitted_attempts(
                self.ledger.as_ref(),
                &scope,
                survivors,
                self.permitted_attempts,
            )
            .await
            .map_err(|cause| EvaluationError::Ledger {
                source_name: ctx.source.name().to_string(),
                failure_type: ctx.failure_type,
                stage: EvaluationStage::PermittedAttempts,
                cause,
            })?;
            survivors = outcome.to_remove;
            report.spared = outcome.spared;
            report.recovered = outcome.recovered.into_iter().map(|(id, _)| id).collect();
        }

        stage.enter(EvaluationStage::Removal);
        for item in &survivors {
            let flags = RemovalFlags {
                remove_from_client: remove_from_client(
                    &checks,
                    ctx.exemptions,
                    self.ignore_private_trackers,
                    item,
                ),
                add_to_blocklist: checks.add_to_blocklist,
            };
            let record = self
                .remover
                .remove(ctx.source, ctx.failure_type, deleted, item, flags)
                .await;
            report.removals.push(record);
        }

        report.removal_set = survivors;
        Ok(report)
    }

    /// [`Self::execute_checks`] with every failure contained.
    ///
    /// Errors and panics are logged with the source, failure type and stage,
    /// and yield an empty report. The process keeps running.
    pub async fn run_checks(
        &self,
        ctx: &EvaluationContext<'_>,
        queue: &[QueueItem],
        affected: Vec<QueueItem>,
        deleted: &mut DeletedDownloads,
    ) -> EvaluationReport {
        let stage = StageTracker::default();
        let result = AssertUnwindSafe(self.execute_tracked(ctx, affected, deleted, &stage))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| {
                Err(EvaluationError::Panicked {
                    source_name: ctx.source.name().to_string(),
                    failure_type: ctx.failure_type,
                    stage: stage.current(),
                    message: panic_message(payload.as_ref()),
                })
            });

        if tracing::enabled!(tracing::Level::DEBUG) {
            match serde_json::to_string(&summarize_queue(queue)) {
                Ok(summary) => tracing::debug!(
                    source = ctx.source.name(),
                    failure_type = %ctx.failure_type,
                    queue = %summary,
                    "Queue after evaluation"
                ),
                Err(e) => tracing::debug!(error = %e, "could not summarize queue"),
            }
        }

        match result {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(
                    source = ctx.source.name(),
                    failure_type = %ctx.failure_type,
                    stage = %e.stage(),
                    error = %e,
                    "Error when running queue cleaning on {} ({})",
                    ctx.source.name(),
                    ctx.failure_type
                );
                EvaluationReport::default()
            }
        }
    }
}

/// Whether the torrent should be deleted from the download client too.
///
/// Kept only when the check asks for it, private exemption is enabled and the
/// download is on a private tracker.
pub fn remove_from_client(
    checks: &CheckOptions,
    exemptions: &ExemptionSets,
    ignore_private_trackers: bool,
    item: &QueueItem,
) -> bool {
    !(checks.keep_torrent_for_private_trackers
        && ignore_private_trackers
        && exemptions.is_private(&item.download_id))
}

/// Last pipeline step entered, readable after a panic unwound the evaluation.
#[derive(Default)]
struct StageTracker(AtomicU8);

impl StageTracker {
    fn enter(&self, stage: EvaluationStage) {
        self.0.store(stage as u8, Ordering::Relaxed);
    }

    fn current(&self) -> EvaluationStage {
        EvaluationStage::from_u8(self.0.load(Ordering::Relaxed))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryDefectLedger;
    use crate::domain::errors::{DomainResult, LedgerError, LedgerResult};
    use crate::domain::models::{
        DefectEntry, FailureType, LedgerSnapshot, RemovalOutcome, SourceInstance, SourceKind,
    };
    use crate::domain::ports::QueueClient;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockQueueClient {
        removed: Mutex<Vec<(i64, bool, bool)>>,
    }

    #[async_trait]
    impl QueueClient for MockQueueClient {
        async fn fetch_queue(&self, _source: &SourceInstance) -> DomainResult<Option<Vec<QueueItem>>> {
            Ok(None)
        }

        async fn remove_queue_item(
            &self,
            _source: &SourceInstance,
            queue_id: i64,
            remove_from_client: bool,
            add_to_blocklist: bool,
        ) -> DomainResult<()> {
            self.removed
                .lock()
                .unwrap()
                .push((queue_id, remove_from_client, add_to_blocklist));
            Ok(())
        }
    }

    struct BrokenLedger;

    #[async_trait]
    impl DefectLedger for BrokenLedger {
        async fn get(&self, _: &LedgerScope, _: &str) -> LedgerResult<Option<DefectEntry>> {
            Err(LedgerError::InvalidAttempts(-1))
        }
        async fn increment(&self, _: &LedgerScope, _: &str, _: &str) -> LedgerResult<DefectEntry> {
            Err(LedgerError::InvalidAttempts(-1))
        }
        async fn delete(&self, _: &LedgerScope, _: &str) -> LedgerResult<Option<DefectEntry>> {
            Ok(None)
        }
        async fn list(&self, _: &LedgerScope) -> LedgerResult<Vec<(String, DefectEntry)>> {
            Ok(Vec::new())
        }
        async fn snapshot(&self) -> LedgerResult<LedgerSnapshot> {
            Ok(LedgerSnapshot::default())
        }
        async fn clear(&self) -> LedgerResult<u64> {
            Ok(0)
        }
    }

    struct PanickingLedger;

    #[async_trait]
    impl DefectLedger for PanickingLedger {
        async fn get(&self, _: &LedgerScope, _: &str) -> LedgerResult<Option<DefectEntry>> {
            Ok(None)
        }
        async fn increment(&self, _: &LedgerScope, _: &str, _: &str) -> LedgerResult<DefectEntry> {
            panic!("ledger exploded")
        }
        async fn delete(&self, _: &LedgerScope, _: &str) -> LedgerResult<Option<DefectEntry>> {
            Ok(None)
        }
        async fn list(&self, _: &LedgerScope) -> LedgerResult<Vec<(String, DefectEntry)>> {
            Ok(Vec::new())
        }
        async fn snapshot(&self) -> LedgerResult<LedgerSnapshot> {
            Ok(LedgerSnapshot::default())
        }
        async fn clear(&self) -> LedgerResult<u64> {
            Ok(0)
        }
    }

    fn settings(permitted_attempts: u32) -> FeatureSettings {
        FeatureSettings {
            permitted_attempts,
            ..FeatureSettings::default()
        }
    }

    fn executor(ledger: Arc<dyn DefectLedger>, client: Arc<MockQueueClient>, permitted: u32) -> CheckExecutor {
        CheckExecutor::new(ledger, RemovalService::new(client, false), &settings(permitted))
    }

    fn source() -> SourceInstance {
        SourceInstance::new(SourceKind::Sonarr, "http://sonarr:8989", "key")
    }

    fn item(id: i64, download_id: &str) -> QueueItem {
        QueueItem::new(id, download_id, format!("Episode {download_id}"), "warning")
    }

    #[tokio::test]
    async fn test_failed_type_removes_without_attempts() {
        let client = Arc::new(MockQueueClient::default());
        let exec = executor(Arc::new(InMemoryDefectLedger::new()), client.clone(), 3);
        let src = source();
        let exemptions = ExemptionSets::default();
        let ctx = EvaluationContext {
            source: &src,
            failure_type: FailureType::Failed,
            checks: FailureType::Failed.default_checks(),
            exemptions: &exemptions,
        };
        let mut deleted = DeletedDownloads::new();

        let report = exec
            .execute_checks(&ctx, vec![item(1, "A"), item(2, "A")], &mut deleted)
            .await
            .unwrap();

        assert_eq!(report.removed_count(), 1);
        assert_eq!(client.removed.lock().unwrap().as_slice(), &[(1, true, true)]);
    }

    #[tokio::test]
    async fn test_private_download_keeps_torrent_for_failed_import() {
        let client = Arc::new(MockQueueClient::default());
        let exec = executor(Arc::new(InMemoryDefectLedger::new()), client.clone(), 3);
        let src = source();
        let exemptions = ExemptionSets {
            private_tracker_download_ids: ["A".to_string()].into_iter().collect(),
            ..Default::default()
        };
        let ctx = EvaluationContext {
            source: &src,
            failure_type: FailureType::FailedImport,
            checks: FailureType::FailedImport.default_checks(),
            exemptions: &exemptions,
        };
        let mut deleted = DeletedDownloads::new();

        let report = exec
            .execute_checks(&ctx, vec![item(1, "A")], &mut deleted)
            .await
            .unwrap();

        assert_eq!(
            report.removals[0].outcome,
            RemovalOutcome::Removed {
                remove_from_client: false,
                add_to_blocklist: true
            }
        );
    }

    #[tokio::test]
    async fn test_ledger_error_reports_stage_and_removes_nothing() {
        let client = Arc::new(MockQueueClient::default());
        let exec = executor(Arc::new(BrokenLedger), client.clone(), 0);
        let src = source();
        let exemptions = ExemptionSets::default();
        let ctx = EvaluationContext {
            source: &src,
            failure_type: FailureType::Stalled,
            checks: FailureType::Stalled.default_checks(),
            exemptions: &exemptions,
        };
        let mut deleted = DeletedDownloads::new();

        let err = exec
            .execute_checks(&ctx, vec![item(1, "A")], &mut deleted)
            .await
            .unwrap_err();
        assert_eq!(err.stage(), EvaluationStage::PermittedAttempts);

        let report = exec.run_checks(&ctx, &[], vec![item(1, "A")], &mut deleted).await;
        assert!(report.removals.is_empty());
        assert!(client.removed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let client = Arc::new(MockQueueClient::default());
        let exec = executor(Arc::new(PanickingLedger), client.clone(), 0);
        let src = source();
        let exemptions = ExemptionSets::default();
        let ctx = EvaluationContext {
            source: &src,
            failure_type: FailureType::Stalled,
            checks: FailureType::Stalled.default_checks(),
            exemptions: &exemptions,
        };
        let mut deleted = DeletedDownloads::new();

        let stage = StageTracker::default();
        let unwound = AssertUnwindSafe(exec.execute_tracked(&ctx, vec![item(1, "A")], &mut deleted, &stage))
            .catch_unwind()
            .await;
        assert!(unwound.is_err());
        assert_eq!(stage.current(), EvaluationStage::PermittedAttempts);

        let report = exec.run_checks(&ctx, &[], vec![item(1, "A")], &mut deleted).await;

        assert!(report.removal_set.is_empty());
        assert!(deleted.is_empty());
    }

    struct PanickingQueueClient;

    #[async_trait]
    impl QueueClient for PanickingQueueClient {
        async fn fetch_queue(&self, _source: &SourceInstance) -> DomainResult<Option<Vec<QueueItem>>> {
            Ok(None)
        }

        async fn remove_queue_item(&self, _: &SourceInstance, _: i64, _: bool, _: bool) -> DomainResult<()> {
            panic!("client exploded")
        }
    }

    #[tokio::test]
    async fn test_panic_during_removal_names_removal_stage() {
        let exec = CheckExecutor::new(
            Arc::new(InMemoryDefectLedger::new()),
            RemovalService::new(Arc::new(PanickingQueueClient), false),
            &settings(3),
        );
        let src = source();
        let exemptions = ExemptionSets::default();
        let ctx = EvaluationContext {
            source: &src,
            failure_type: FailureType::Failed,
            checks: FailureType::Failed.default_checks(),
            exemptions: &exemptions,
        };
        let mut deleted = DeletedDownloads::new();
        let stage = StageTracker::default();

        let unwound = AssertUnwindSafe(exec.execute_tracked(&ctx, vec![item(1, "A")], &mut deleted, &stage))
            .catch_unwind()
            .await;

        assert!(unwound.is_err());
        assert_eq!(stage.current(), EvaluationStage::Removal);
        assert!(deleted.is_empty());
    }

    #[test]
    fn test_remove_from_client_rule() {
        let checks = FailureType::FailedImport.default_checks();
        let exemptions = ExemptionSets {
            private_tracker_download_ids: ["P".to_string()].into_iter().collect(),
            ..Default::default()
        };
        assert!(!remove_from_client(&checks, &exemptions, true, &item(1, "P")));
        assert!(remove_from_client(&checks, &exemptions, false, &item(1, "P")));
        assert!(remove_from_client(&checks, &exemptions, true, &item(2, "Q")));

        let stalled = FailureType::Stalled.default_checks();
        assert!(remove_from_client(&stalled, &exemptions, true, &item(1, "P")));
    }
}
