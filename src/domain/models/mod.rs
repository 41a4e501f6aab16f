//! Domain models for the queue sweeper

pub mod config;
pub mod evaluation;
pub mod failure;
pub mod ledger;
pub mod queue;
pub mod source;

pub use config::{
    ArrAppConfig, Config, FeatureSettings, FeaturesConfig, GeneralConfig, LedgerBackend,
    LedgerConfig, LoggingConfig, QbittorrentConfig, RetryConfig, SourcesConfig,
};
pub use evaluation::{
    AttemptVerdict, EvaluationContext, EvaluationReport, ExemptionSets, RemovalOutcome,
    RemovalRecord,
};
pub use failure::{CheckOptions, FailureType};
pub use ledger::{DefectEntry, DeletedDownloads, LedgerScope, LedgerSnapshot};
pub use queue::{QueueItem, QueuePage, StatusMessage, DELAYED_STATUS};
pub use source::{SourceInstance, SourceKind};
