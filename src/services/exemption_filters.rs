//! Exemption filters applied before attempt accounting.
//!
//! Both filters drop items rather than marking them, so exempt downloads
//! never advance their attempt counters.

use crate::domain::models::{ExemptionSets, FailureType, QueueItem};

/// Drop private-tracker downloads when `ignore_private_trackers` is set.
pub fn private_tracker_filter(
    affected: Vec<QueueItem>,
    exemptions: &ExemptionSets,
    ignore_private_trackers: bool,
) -> Vec<QueueItem> {
    if !ignore_private_trackers {
        return affected;
    }
    affected
        .into_iter()
        .filter(|item| !exemptions.is_private(&item.download_id))
        .collect()
}

/// Drop downloads tagged as protected in the torrent client.
pub fn protected_download_filter(
    affected: Vec<QueueItem>,
    exemptions: &ExemptionSets,
    failure_type: FailureType,
) -> Vec<QueueItem> {
    affected
        .into_iter()
        .filter(|item| {
            if !exemptions.is_protected(&item.download_id) {
                return true;
            }
            tracing::info!(
                failure_type = %failure_type,
                title = %item.title,
                "Detected {} download, tagged not to be killed: {}",
                failure_type,
                item.title
            );
            tracing::debug!(
                failure_type = %failure_type,
                download_id = %item.download_id,
                "DownloadID of protected download"
            );
            false
        })
        .collect()
}
