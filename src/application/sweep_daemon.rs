//! Polling daemon that sweeps every configured source.
//!
//! A cycle walks the sources in order. Per source it checks that the torrent
//! client is online, fetches and normalizes the queue, fetches the exemption
//! sets and then evaluates every enabled failure type. A failure on one
//! source skips that source for the cycle only.

use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::{interval, MissedTickBehavior};
use tracing::Instrument;
use uuid::Uuid;

use crate::domain::models::{
    Config, DeletedDownloads, EvaluationContext, ExemptionSets, FailureType, QueueItem,
    SourceInstance,
};
use crate::domain::ports::{ExemptionProvider, FailureClassifier, QueueClient};
use crate::infrastructure::config::MIN_CYCLE_SECS;
use crate::services::check_executor::CheckExecutor;
use crate::services::queue_normalizer::normalize;

/// Settings of the polling loop.
#[derive(Debug, Clone)]
pub struct SweepDaemonConfig {
    /// Time between the start of two cycles.
    pub cycle_interval: Duration,
    pub failure_types: Vec<FailureType>,
    pub ignored_download_clients: Vec<String>,
}

impl SweepDaemonConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            cycle_interval: cycle_interval(config.features.remove_timer),
            failure_types: config.features.enabled_failure_types(),
            ignored_download_clients: config.feature_settings.ignored_download_clients.clone(),
        }
    }
}

/// Sweep period for `remove_timer` minutes, never shorter than a second.
fn cycle_interval(remove_timer: f64) -> Duration {
    let minimum = Duration::from_secs_f64(MIN_CYCLE_SECS);
    Duration::try_from_secs_f64(remove_timer * 60.0)
        .unwrap_or(minimum)
        .max(minimum)
}

/// Removals of one (source, failure type) evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluationSummary {
    pub source: String,
    pub failure_type: FailureType,
    pub affected: usize,
    pub removed: usize,
}

/// What one cycle did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CycleReport {
    /// Identifies the daemon process the cycle ran in
    pub run_id: Uuid,
    pub cycle: u64,
    pub evaluations: Vec<EvaluationSummary>,
    pub skipped_sources: Vec<String>,
}

impl CycleReport {
    pub fn total_removed(&self) -> usize {
        self.evaluations.iter().map(|e| e.removed).sum()
    }
}

/// Handle to stop a running daemon.
#[derive(Clone)]
pub struct DaemonHandle {
    stop_flag: Arc<AtomicBool>,
    wake: Arc<Notify>,
}

impl DaemonHandle {
    /// Request the daemon to stop after the current cycle.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::Release);
        self.wake.notify_one();
    }
}

/// Queue sweeper daemon.
///
/// Owns the deleted-download ledger, which lives as long as the daemon.
pub struct SweepDaemon {
    sources: Vec<SourceInstance>,
    queue_client: Arc<dyn QueueClient>,
    classifier: Arc<dyn FailureClassifier>,
    exemptions: Arc<dyn ExemptionProvider>,
    executor: CheckExecutor,
    config: SweepDaemonConfig,
    deleted: DeletedDownloads,
    run_id: Uuid,
    cycles: u64,
    stop_flag: Arc<AtomicBool>,
    wake: Arc<Notify>,
}

impl SweepDaemon {
    pub fn new(
        sources: Vec<SourceInstance>,
        queue_client: Arc<dyn QueueClient>,
        classifier: Arc<dyn FailureClassifier>,
        exemptions: Arc<dyn ExemptionProvider>,
        executor: CheckExecutor,
        config: SweepDaemonConfig,
    ) -> Self {
        Self {
            sources,
            queue_client,
            classifier,
            exemptions,
            executor,
            config,
            deleted: DeletedDownloads::new(),
            run_id: Uuid::new_v4(),
            cycles: 0,
            stop_flag: Arc::new(AtomicBool::new(false)),
            wake: Arc::new(Notify::new()),
        }
    }

    pub fn handle(&self) -> DaemonHandle {
        DaemonHandle {
            stop_flag: self.stop_flag.clone(),
            wake: self.wake.clone(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn deleted_downloads(&self) -> &DeletedDownloads {
        &self.deleted
    }

    /// Run cycles until Ctrl-C or [`DaemonHandle::stop`].
    pub async fn run(&mut self) {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        })
        .await;
    }

    /// Run a cycle immediately, then one per interval until `shutdown` resolves.
    pub async fn run_until<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut timer = interval(self.config.cycle_interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            run_id = %self.run_id,
            sources = self.sources.len(),
            interval_secs = self.config.cycle_interval.as_secs(),
            "queue sweeper started"
        );

        loop {
            tokio::select! {
                _ = timer.tick() => {
                    if self.stop_flag.load(Ordering::Acquire) {
                        break;
                    }
                    let report = self.run_cycle().await;
                    tracing::info!(
                        cycle = report.cycle,
                        removed = report.total_removed(),
                        skipped_sources = report.skipped_sources.len(),
                        "cycle finished"
                    );
                }
                () = self.wake.notified() => {
                    break;
                }
                () = &mut shutdown => {
                    tracing::info!("shutdown signal received");
                    break;
                }
            }
        }

        tracing::info!("queue sweeper stopped");
    }

    /// Run a single cycle over all sources.
    pub async fn run_cycle(&mut self) -> CycleReport {
        self.cycles += 1;
        let span = tracing::info_span!("cycle", run_id = %self.run_id, cycle = self.cycles);
        let mut report = CycleReport {
            run_id: self.run_id,
            cycle: self.cycles,
            ..Default::default()
        };

        let sources = self.sources.clone();
        async {
            for source in &sources {
                match self.sweep_source(source).await {
                    Some(evaluations) => report.evaluations.extend(evaluations),
                    None => report.skipped_sources.push(source.name().to_string()),
                }
            }
        }
        .instrument(span)
        .await;
        report
    }

    async fn sweep_source(&mut self, source: &SourceInstance) -> Option<Vec<EvaluationSummary>> {
        match self.exemptions.is_offline().await {
            Ok(false) => {}
            Ok(true) => {
                tracing::warn!(
                    source = source.name(),
                    "torrent client is disconnected, skipping {} this cycle",
                    source.name()
                );
                return None;
            }
            Err(e) => {
                tracing::warn!(source = source.name(), error = %e, "could not reach torrent client");
                return None;
            }
        }

        let queue = match self.queue_client.fetch_queue(source).await {
            Ok(queue) => queue,
            Err(e) => {
                tracing::warn!(source = source.name(), error = %e, "failed to fetch queue");
                return None;
            }
        };
        let queue = normalize(queue.as_deref(), &self.config.ignored_download_clients)?;

        let exemptions = match self.fetch_exemptions(source).await {
            Ok(sets) => sets,
            Err(e) => {
                tracing::warn!(source = source.name(), error = %e, "failed to fetch exemption sets");
                return None;
            }
        };

        let mut evaluations = Vec::with_capacity(self.config.failure_types.len());
        for failure_type in self.config.failure_types.clone() {
            evaluations.push(self.evaluate(source, failure_type, &queue, &exemptions).await);
        }
        Some(evaluations)
    }

    async fn fetch_exemptions(
        &self,
        source: &SourceInstance,
    ) -> crate::domain::errors::DomainResult<ExemptionSets> {
        Ok(ExemptionSets {
            private_tracker_download_ids: self.exemptions.private_tracker_download_ids(source).await?,
            protected_download_ids: self.exemptions.protected_download_ids(source).await?,
        })
    }

    async fn evaluate(
        &mut self,
        source: &SourceInstance,
        failure_type: FailureType,
        queue: &[QueueItem],
        exemptions: &ExemptionSets,
    ) -> EvaluationSummary {
        let affected = self.classifier.classify(failure_type, queue);
        let affected_count = affected.len();
        let ctx = EvaluationContext {
            source,
            failure_type,
            checks: failure_type.default_checks(),
            exemptions,
        };
        let report = self
            .executor
            .run_checks(&ctx, queue, affected, &mut self.deleted)
            .await;

        EvaluationSummary {
            source: source.name().to_string(),
            failure_type,
            affected: affected_count,
            removed: report.removed_count(),
        }
    }
}
