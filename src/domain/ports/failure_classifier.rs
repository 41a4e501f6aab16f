use crate::domain::models::{FailureType, QueueItem};

/// Decides which queue items exhibit a failure type.
///
/// The result may contain several rows sharing a download id; the engine
/// deduplicates it.
pub trait FailureClassifier: Send + Sync {
    fn classify(&self, failure_type: FailureType, queue: &[QueueItem]) -> Vec<QueueItem>;
}
