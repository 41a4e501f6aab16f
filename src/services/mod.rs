pub mod check_executor;
pub mod exemption_filters;
pub mod permitted_attempts;
pub mod queue_normalizer;
pub mod queue_rules;
pub mod removal_service;

pub use check_executor::CheckExecutor;
pub use permitted_attempts::{check_permitted_attempts, AttemptsOutcome};
pub use queue_normalizer::{
    dedup_by_download_id, filter_missing_download_id, normalize, summarize_queue, QueueSummary,
};
pub use queue_rules::QueueRuleClassifier;
pub use removal_service::{RemovalFlags, RemovalService};
