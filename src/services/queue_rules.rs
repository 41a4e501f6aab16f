//! Classification of queue rows by their *arr status fields.

use crate::domain::models::{FailureType, QueueItem};
use crate::domain::ports::FailureClassifier;

const STALLED_MESSAGE: &str = "The download is stalled with no connections";
const METADATA_MESSAGE: &str = "qBittorrent is downloading metadata";
const MISSING_FILES_MESSAGE: &str = "The download is missing files";
const NO_ELIGIBLE_FILES_MESSAGE: &str = "No files found are eligible for import";
const FAILED_IMPORT_STATES: [&str; 3] = ["importPending", "importFailed", "importBlocked"];

/// Classifier driven by status, error message and tracked-download state.
#[derive(Debug, Clone, Default)]
pub struct QueueRuleClassifier {
    failed_import_patterns: Vec<String>,
}

impl QueueRuleClassifier {
    /// `failed_import_patterns` narrows failed imports to rows with a status
    /// message containing one of the patterns; empty matches every row.
    pub fn new(failed_import_patterns: Vec<String>) -> Self {
        Self {
            failed_import_patterns,
        }
    }

    fn matches(&self, failure_type: FailureType, item: &QueueItem) -> Option<Vec<String>> {
        let error = item.error_message.as_deref().unwrap_or_default();
        let matched = match failure_type {
            FailureType::Failed => item.status == "failed",
            FailureType::Stalled => item.status == "warning" && error == STALLED_MESSAGE,
            FailureType::MetadataMissing => item.status == "queued" && error == METADATA_MESSAGE,
            FailureType::MissingFiles => {
                (item.status == "warning" && error == MISSING_FILES_MESSAGE)
                    || (item.status == "completed" && has_status_message(item, NO_ELIGIBLE_FILES_MESSAGE))
            }
            FailureType::FailedImport => return self.failed_import_messages(item),
        };
        matched.then(Vec::new)
    }

    fn failed_import_messages(&self, item: &QueueItem) -> Option<Vec<String>> {
        let tracked_warning = item.tracked_download_status.as_deref() == Some("warning");
        let import_state = item
            .tracked_download_state
            .as_deref()
            .is_some_and(|state| FAILED_IMPORT_STATES.contains(&state));
        if item.status != "completed" || !tracked_warning || !import_state {
            return None;
        }

        let messages: Vec<String> = item
            .status_messages
            .iter()
            .flat_map(|m| m.messages.iter())
            .filter(|message| {
                self.failed_import_patterns.is_empty()
                    || self
                        .failed_import_patterns
                        .iter()
                        .any(|pattern| message.contains(pattern.as_str()))
            })
            .map(|message| format!(">>>>> - {message}"))
            .collect();

        if self.failed_import_patterns.is_empty() || !messages.is_empty() {
            Some(messages)
        } else {
            None
        }
    }
}

fn has_status_message(item: &QueueItem, needle: &str) -> bool {
    item.status_messages
        .iter()
        .flat_map(|m| m.messages.iter())
        .any(|message| message.contains(needle))
}

impl FailureClassifier for QueueRuleClassifier {
    fn classify(&self, failure_type: FailureType, queue: &[QueueItem]) -> Vec<QueueItem> {
        queue
            .iter()
            .filter_map(|item| {
                self.matches(failure_type, item).map(|messages| {
                    let mut item = item.clone();
                    item.removal_messages = messages;
                    item
                })
            })
            .collect()
    }
}
