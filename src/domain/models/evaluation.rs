//! Inputs and results of a single (source, failure type) evaluation.

use serde::Serialize;
use std::collections::HashSet;

use super::{CheckOptions, FailureType, QueueItem, SourceInstance};

/// Download ids exempt from removal, fetched fresh for every evaluation.
#[derive(Debug, Clone, Default)]
pub struct ExemptionSets {
    pub private_tracker_download_ids: HashSet<String>,
    pub protected_download_ids: HashSet<String>,
}

impl ExemptionSets {
    pub fn is_private(&self, download_id: &str) -> bool {
        self.private_tracker_download_ids.contains(download_id)
    }

    pub fn is_protected(&self, download_id: &str) -> bool {
        self.protected_download_ids.contains(download_id)
    }
}

/// Everything an evaluation needs besides the affected items and the ledgers.
#[derive(Debug, Clone)]
pub struct EvaluationContext<'a> {
    pub source: &'a SourceInstance,
    pub failure_type: FailureType,
    pub checks: CheckOptions,
    pub exemptions: &'a ExemptionSets,
}

/// Where a tracked download stands after its attempt counter moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptVerdict {
    /// Still within the permitted number of observations; not removed.
    Spared,
    /// First observation past the limit; removed.
    Exceeded,
    /// Past the limit more than once: an earlier removal did not stick.
    Recurring,
}

impl AttemptVerdict {
    /// Classify `attempts` against `permitted` (`attempts_left = permitted - attempts`).
    pub fn from_attempts(permitted: u32, attempts: u32) -> Self {
        let attempts_left = i64::from(permitted) - i64::from(attempts);
        match attempts_left {
            left if left >= 0 => Self::Spared,
            -1 => Self::Exceeded,
            _ => Self::Recurring,
        }
    }

    pub fn removes(&self) -> bool {
        !matches!(self, Self::Spared)
    }
}

/// How a single removal request ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RemovalOutcome {
    /// The source application accepted the removal.
    Removed { remove_from_client: bool, add_to_blocklist: bool },
    /// Dry run: recorded as removed, nothing sent.
    Simulated { remove_from_client: bool, add_to_blocklist: bool },
    /// The download id was already removed earlier in this run.
    AlreadyRemoved,
    /// The removal call failed; the item stays eligible next cycle.
    Failed { error: String },
}

impl RemovalOutcome {
    pub fn counts_as_removed(&self) -> bool {
        matches!(self, Self::Removed { .. } | Self::Simulated { .. })
    }
}

/// A removed (or attempted) queue item with its outcome.
#[derive(Debug, Clone, Serialize)]
pub struct RemovalRecord {
    pub queue_id: i64,
    pub download_id: String,
    pub title: String,
    #[serde(flatten)]
    pub outcome: RemovalOutcome,
}

/// Result of one completed evaluation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EvaluationReport {
    /// Items that survived every filter, in affected-set order.
    pub removal_set: Vec<QueueItem>,
    pub removals: Vec<RemovalRecord>,
    pub recovered: Vec<String>,
    pub spared: Vec<String>,
}

impl EvaluationReport {
    /// Number of items actually removed (or simulated) in this evaluation.
    pub fn removed_count(&self) -> usize {
        self.removals
            .iter()
            .filter(|r| r.outcome.counts_as_removed())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_boundaries() {
        assert_eq!(AttemptVerdict::from_attempts(3, 1), AttemptVerdict::Spared);
        assert_eq!(AttemptVerdict::from_attempts(3, 3), AttemptVerdict::Spared);
        assert_eq!(AttemptVerdict::from_attempts(3, 4), AttemptVerdict::Exceeded);
        assert_eq!(AttemptVerdict::from_attempts(3, 5), AttemptVerdict::Recurring);
        assert_eq!(AttemptVerdict::from_attempts(0, 1), AttemptVerdict::Exceeded);
    }

    #[test]
    fn test_only_spared_is_kept() {
        assert!(!AttemptVerdict::Spared.removes());
        assert!(AttemptVerdict::Exceeded.removes());
        assert!(AttemptVerdict::Recurring.removes());
    }

    #[test]
    fn test_removed_count_ignores_failures() {
        let record = |download_id: &str, outcome| RemovalRecord {
            queue_id: 1,
            download_id: download_id.to_string(),
            title: "t".to_string(),
            outcome,
        };
        let report = EvaluationReport {
            removals: vec![
                record("A", RemovalOutcome::Removed { remove_from_client: true, add_to_blocklist: true }),
                record("B", RemovalOutcome::Failed { error: "timeout".to_string() }),
                record("C", RemovalOutcome::AlreadyRemoved),
                record("D", RemovalOutcome::Simulated { remove_from_client: false, add_to_blocklist: true }),
            ],
            ..Default::default()
        };
        assert_eq!(report.removed_count(), 2);
    }
}
