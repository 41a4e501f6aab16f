//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines async trait interfaces that adapters must implement:
//! - DefectLedger: storage of per-download attempt counters
//! - QueueClient: queue fetch and removal against the *arr apps
//! - ExemptionProvider: private-tracker and protected downloads from the torrent client
//! - FailureClassifier: which queue items exhibit a failure type
//!
//! These traits define the contracts that allow the decision engine to be
//! independent of specific HTTP or storage implementations.

pub mod defect_ledger;
pub mod exemption_provider;
pub mod failure_classifier;
pub mod queue_client;

pub use defect_ledger::DefectLedger;
pub use exemption_provider::{ExemptionProvider, NullExemptionProvider};
pub use failure_classifier::FailureClassifier;
pub use queue_client::QueueClient;
