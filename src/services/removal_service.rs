//! Removal of queue items with at-most-once semantics per download id.

use std::sync::Arc;

use crate::domain::models::{
    DeletedDownloads, FailureType, QueueItem, RemovalOutcome, RemovalRecord, SourceInstance,
};
use crate::domain::ports::QueueClient;

/// How one item should be removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemovalFlags {
    /// Also delete the torrent (and its data) from the download client.
    pub remove_from_client: bool,
    /// Blocklist the release so the source does not grab it again.
    pub add_to_blocklist: bool,
}

/// Issues removal requests and records removed download ids.
#[derive(Clone)]
pub struct RemovalService {
    client: Arc<dyn QueueClient>,
    dry_run: bool,
}

impl RemovalService {
    pub fn new(client: Arc<dyn QueueClient>, dry_run: bool) -> Self {
        Self { client, dry_run }
    }

    /// Remove `item` unless its download id was already removed this run.
    ///
    /// The id is recorded in `deleted` only when the call succeeds or in dry
    /// run; a failed call leaves the item eligible for the next cycle.
    pub async fn remove(
        &self,
        source: &SourceInstance,
        failure_type: FailureType,
        deleted: &mut DeletedDownloads,
        item: &QueueItem,
        flags: RemovalFlags,
    ) -> RemovalRecord {
        let outcome = self.remove_inner(source, failure_type, deleted, item, flags).await;
        RemovalRecord {
            queue_id: item.id,
            download_id: item.download_id.clone(),
            title: item.title.clone(),
            outcome,
        }
    }

    async fn remove_inner(
        &self,
        source: &SourceInstance,
        failure_type: FailureType,
        deleted: &mut DeletedDownloads,
        item: &QueueItem,
        flags: RemovalFlags,
    ) -> RemovalOutcome {
        if deleted.contains(&item.download_id) {
            tracing::debug!(
                download_id = %item.download_id,
                "download already removed in this run, skipping"
            );
            return RemovalOutcome::AlreadyRemoved;
        }

        if flags.remove_from_client {
            tracing::info!(
                source = source.name(),
                %failure_type,
                title = %item.title,
                "Removing {} download: {}",
                failure_type,
                item.title
            );
        } else {
            tracing::info!(
                source = source.name(),
                %failure_type,
                title = %item.title,
                "Removing {} download (without removing from torrent client): {}",
                failure_type,
                item.title
            );
        }
        for message in &item.removal_messages {
            tracing::info!("{}", message);
        }

        if self.dry_run {
            deleted.record(&item.download_id);
            return RemovalOutcome::Simulated {
                remove_from_client: flags.remove_from_client,
                add_to_blocklist: flags.add_to_blocklist,
            };
        }

        match self
            .client
            .remove_queue_item(source, item.id, flags.remove_from_client, flags.add_to_blocklist)
            .await
        {
            Ok(()) => {
                deleted.record(&item.download_id);
                RemovalOutcome::Removed {
                    remove_from_client: flags.remove_from_client,
                    add_to_blocklist: flags.add_to_blocklist,
                }
            }
            Err(e) => {
                tracing::warn!(
                    source = source.name(),
                    %failure_type,
                    queue_id = item.id,
                    error = %e,
                    "Failed to remove {} download: {}",
                    failure_type,
                    item.title
                );
                RemovalOutcome::Failed { error: e.to_string() }
            }
        }
    }
}
