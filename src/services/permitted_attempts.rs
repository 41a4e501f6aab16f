//! Permitted-attempts state machine.
//!
//! Per (source, failure type, download id) a download moves from untracked
//! to tracked with a growing attempt counter. It either recovers (leaves the
//! affected set, entry deleted) or exceeds the permitted number of
//! observations and is handed to removal.
//!
//! Ledger updates are applied item by item. If the evaluation is cancelled
//! halfway, some counters may have moved and others not; the next cycle
//! evaluates from whatever was stored.

use std::collections::HashSet;

use crate::domain::errors::LedgerResult;
use crate::domain::models::{AttemptVerdict, DefectEntry, LedgerScope, QueueItem};
use crate::domain::ports::DefectLedger;
use crate::services::queue_normalizer::dedup_by_download_id;

/// Result of one pass of the state machine.
#[derive(Debug, Clone, Default)]
pub struct AttemptsOutcome {
    /// Items past their permitted attempts, in affected-set order.
    pub to_remove: Vec<QueueItem>,
    /// Download ids still within their grace period.
    pub spared: Vec<String>,
    /// Entries deleted because their download is no longer affected.
    pub recovered: Vec<(String, DefectEntry)>,
}

/// Advance the attempt counters of `affected` and return the items to remove.
pub async fn check_permitted_attempts(
    ledger: &dyn DefectLedger,
    scope: &LedgerScope,
    affected: Vec<QueueItem>,
    permitted_attempts: u32,
) -> LedgerResult<AttemptsOutcome> {
    let affected = dedup_by_download_id(affected);
    tracing::debug!(
        failure_type = %scope.failure_type,
        affected = %affected
            .iter()
            .map(|i| format!("{}:{}:{}", i.id, i.title, i.download_id))
            .collect::<Vec<_>>()
            .join(", "),
        "permitted attempts check input"
    );

    let recovered = recover_missing(ledger, scope, &affected).await?;

    let mut verdicts = Vec::with_capacity(affected.len());
    for item in affected.iter().rev() {
        let entry = ledger.increment(scope, &item.download_id, &item.title).await?;
        let verdict = AttemptVerdict::from_attempts(permitted_attempts, entry.attempts);
        report_verdict(scope, item, verdict, entry.attempts, permitted_attempts);
        verdicts.push(verdict);
    }
    verdicts.reverse();

    let (to_remove, spared): (Vec<_>, Vec<_>) = affected
        .into_iter()
        .zip(verdicts)
        .partition(|(_, verdict)| verdict.removes());

    Ok(AttemptsOutcome {
        to_remove: to_remove.into_iter().map(|(item, _)| item).collect(),
        spared: spared.into_iter().map(|(item, _)| item.download_id).collect(),
        recovered,
    })
}

/// Delete every tracked entry of `scope` whose download is not in `affected`.
async fn recover_missing(
    ledger: &dyn DefectLedger,
    scope: &LedgerScope,
    affected: &[QueueItem],
) -> LedgerResult<Vec<(String, DefectEntry)>> {
    let still_affected: HashSet<&str> = affected.iter().map(|i| i.download_id.as_str()).collect();
    let mut recovered = Vec::new();

    for (download_id, _) in ledger.list(scope).await? {
        if still_affected.contains(download_id.as_str()) {
            continue;
        }
        if let Some(entry) = ledger.delete(scope, &download_id).await? {
            tracing::info!(
                failure_type = %scope.failure_type,
                title = %entry.title,
                "Download no longer marked as {}: {}",
                scope.failure_type,
                entry.title
            );
            recovered.push((download_id, entry));
        }
    }
    Ok(recovered)
}

fn report_verdict(
    scope: &LedgerScope,
    item: &QueueItem,
    verdict: AttemptVerdict,
    attempts: u32,
    permitted: u32,
) {
    let failure_type = scope.failure_type;
    match verdict {
        AttemptVerdict::Spared => tracing::info!(
            %failure_type,
            attempts,
            permitted,
            title = %item.title,
            "Detected {} download ({} out of {} permitted times): {}",
            failure_type,
            attempts,
            permitted,
            item.title
        ),
        AttemptVerdict::Exceeded | AttemptVerdict::Recurring => tracing::info!(
            %failure_type,
            attempts,
            permitted,
            title = %item.title,
            "Detected {} download too many times ({} out of {} permitted times): {}",
            failure_type,
            attempts,
            permitted,
            item.title
        ),
    }
    if verdict == AttemptVerdict::Recurring {
        tracing::warn!(
            %failure_type,
            title = %item.title,
            "[Tip!] This download should already have been removed in a previous cycle but keeps \
             coming back, so blocklisting it does not stick. Consider enabling \"Reject Blocklisted \
             Torrent Hashes While Grabbing\" on the indexer in the *arr app: {}",
            item.title
        );
    }
}
