//! Queue normalization: drops rows the engine must never act on and
//! collapses rows that share a download id.

use serde::Serialize;
use std::collections::HashSet;

use crate::domain::models::QueueItem;

/// Remove rows without a download id, delayed rows and rows of ignored
/// download clients.
///
/// `None` (no data this cycle) passes through. Survivors keep their order.
pub fn normalize(queue: Option<&[QueueItem]>, ignored_clients: &[String]) -> Option<Vec<QueueItem>> {
    let queue = filter_missing_download_id(queue?);
    let queue = filter_delayed(&queue);
    Some(filter_ignored_clients(&queue, ignored_clients))
}

/// Drop rows the download client has not assigned a download id to yet.
///
/// The download id is the identity used by dedup, the ledger and removal, so
/// an empty one would make unrelated rows look like one download.
pub fn filter_missing_download_id(queue: &[QueueItem]) -> Vec<QueueItem> {
    queue
        .iter()
        .filter(|item| {
            let missing = item.download_id.trim().is_empty();
            if missing {
                tracing::debug!(
                    queue_id = item.id,
                    title = %item.title,
                    "Queue item without download id ignored"
                );
            }
            !missing
        })
        .cloned()
        .collect()
}

/// Drop rows held back by a delay profile.
///
/// Delayed rows come back every cycle, so each distinct
/// (title, protocol, indexer) combination is logged once per call.
pub fn filter_delayed(queue: &[QueueItem]) -> Vec<QueueItem> {
    let mut seen: HashSet<(&str, &str, &str)> = HashSet::new();
    let mut kept = Vec::with_capacity(queue.len());

    for item in queue {
        if !item.is_delayed() {
            kept.push(item.clone());
            continue;
        }
        let combination = (
            item.title.as_str(),
            item.protocol_or_default(),
            item.indexer_or_default(),
        );
        if seen.insert(combination) {
            tracing::debug!(
                title = %item.title,
                protocol = item.protocol_or_default(),
                indexer = item.indexer_or_default(),
                "Delayed queue item ignored"
            );
        }
    }
    kept
}

/// Drop rows whose download client is listed in `ignored_clients`.
pub fn filter_ignored_clients(queue: &[QueueItem], ignored_clients: &[String]) -> Vec<QueueItem> {
    queue
        .iter()
        .filter(|item| {
            let client = item.download_client_or_default();
            let ignored = ignored_clients.iter().any(|c| c == client);
            if ignored {
                tracing::debug!(
                    title = %item.title,
                    download_client = client,
                    "Queue item ignored due to ignored download client"
                );
            }
            !ignored
        })
        .cloned()
        .collect()
}

/// Keep the first row of every download id.
pub fn dedup_by_download_id(items: Vec<QueueItem>) -> Vec<QueueItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.download_id.clone()))
        .collect()
}

/// Queue rows grouped by download id, for debug output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueSummary {
    pub download_id: String,
    pub title: String,
    pub queue_ids: Vec<i64>,
}

/// Group queue rows by download id, keeping first-seen order.
pub fn summarize_queue(queue: &[QueueItem]) -> Vec<QueueSummary> {
    let mut summaries: Vec<QueueSummary> = Vec::new();
    for item in queue {
        match summaries.iter_mut().find(|s| s.download_id == item.download_id) {
            Some(existing) => existing.queue_ids.push(item.id),
            None => summaries.push(QueueSummary {
                download_id: item.download_id.clone(),
                title: item.title.clone(),
                queue_ids: vec![item.id],
            }),
        }
    }
    summaries
}
