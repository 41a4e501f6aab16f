//! Domain layer for the queue sweeper
//!
//! This module contains the queue models, the ledgers and the port traits
//! implemented by the adapters.

pub mod errors;
pub mod models;
pub mod ports;

// Re-export error types for convenient access
pub use errors::{
    DomainError, DomainResult, EvaluationError, EvaluationStage, LedgerError, LedgerResult,
};
