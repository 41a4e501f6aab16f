//! Wiring of adapters and services from a loaded [`Config`].

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::adapters::{ArrClient, InMemoryDefectLedger, QbitClient, RetryPolicy};
use crate::adapters::sqlite::open_migrated_ledger;
use crate::application::sweep_daemon::{SweepDaemon, SweepDaemonConfig};
use crate::domain::models::{Config, LedgerBackend, LedgerConfig};
use crate::domain::ports::{DefectLedger, ExemptionProvider, NullExemptionProvider};
use crate::services::{CheckExecutor, QueueRuleClassifier, RemovalService};

/// Open the defectiveness ledger selected by `config`.
pub async fn open_defect_ledger(config: &LedgerConfig) -> Result<Arc<dyn DefectLedger>> {
    match config.backend {
        LedgerBackend::Memory => Ok(Arc::new(InMemoryDefectLedger::new())),
        LedgerBackend::Sqlite => {
            let ledger = open_migrated_ledger(&config.database_path)
                .await
                .with_context(|| format!("Failed to open ledger database at {}", config.database_path))?;
            Ok(Arc::new(ledger))
        }
    }
}

/// Torrent client exemption provider, or one that exempts nothing when no
/// client is configured.
pub fn exemption_provider(config: &Config) -> Result<Arc<dyn ExemptionProvider>> {
    let Some(base_url) = config.qbittorrent_api_url() else {
        tracing::info!("no torrent client configured, exemption checks are disabled");
        return Ok(Arc::new(NullExemptionProvider::new()));
    };
    let client = QbitClient::new(
        base_url,
        config.qbittorrent.username.clone(),
        config.qbittorrent.password.clone(),
        config.feature_settings.no_stalled_removal_qbit_tag.clone(),
        config.feature_settings.ignore_private_trackers,
        config.general.ssl_verification,
    )
    .context("Failed to create qBittorrent client")?;
    Ok(Arc::new(client))
}

/// Build a daemon for every configured source.
///
/// `dry_run` forces a test run even when `general.test_run` is off.
pub async fn build_sweep_daemon(config: &Config, dry_run: bool) -> Result<SweepDaemon> {
    let dry_run = dry_run || config.general.test_run;
    if dry_run {
        tracing::info!("test run: removals are logged but not sent");
    }

    let queue_client = Arc::new(
        ArrClient::new(config.general.ssl_verification, RetryPolicy::from(&config.retry))
            .context("Failed to create *arr client")?,
    );
    let ledger = open_defect_ledger(&config.ledger).await?;
    let executor = CheckExecutor::new(
        ledger,
        RemovalService::new(queue_client.clone(), dry_run),
        &config.feature_settings,
    );
    let classifier = Arc::new(QueueRuleClassifier::new(
        config.feature_settings.failed_import_message_patterns.clone(),
    ));

    Ok(SweepDaemon::new(
        config.source_instances(),
        queue_client,
        classifier,
        exemption_provider(config)?,
        executor,
        SweepDaemonConfig::from_config(config),
    ))
}
