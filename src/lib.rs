//! Queue Sweeper - download queue cleaner for *arr applications
//!
//! Queue Sweeper polls the download queues of Radarr, Sonarr, Lidarr, Readarr
//! and Whisparr, detects failed, stalled, metadata-missing, missing-files and
//! failed-import downloads, and removes them once they have been observed
//! defective more often than permitted.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Queue and ledger models, errors and ports
//! - **Service Layer** (`services`): The evaluation pipeline
//! - **Adapters** (`adapters`): *arr and qBittorrent HTTP clients, ledger stores
//! - **Application Layer** (`application`): The polling daemon and its wiring
//! - **Infrastructure Layer** (`infrastructure`): Configuration and logging
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use queue_sweeper::application::build_sweep_daemon;
//! use queue_sweeper::ConfigLoader;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::load(None)?;
//!     let mut daemon = build_sweep_daemon(&config, false).await?;
//!     daemon.run_cycle().await;
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use application::{CycleReport, SweepDaemon};
pub use domain::models::{
    CheckOptions, Config, DefectEntry, DeletedDownloads, EvaluationReport, ExemptionSets,
    FailureType, LedgerSnapshot, QueueItem, SourceInstance, SourceKind,
};
pub use domain::ports::{DefectLedger, ExemptionProvider, FailureClassifier, QueueClient};
pub use domain::{DomainError, EvaluationError, LedgerError};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::CheckExecutor;
