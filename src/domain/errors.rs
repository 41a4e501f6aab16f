//! Domain errors for the queue sweeper.

use thiserror::Error;

use crate::domain::models::FailureType;

/// Domain-level errors raised by ports and adapters.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("HTTP request to {url} failed: {message}")]
    Http { url: String, message: String },

    #[error("{url} returned {status}: {body}")]
    Api { url: String, status: u16, body: String },

    #[error("Torrent client login failed: {0}")]
    Authentication(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl DomainError {
    /// Whether retrying the same request may succeed.
    ///
    /// Transport failures, rate limiting and server-side errors are transient;
    /// other client errors are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http { .. } => true,
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}

/// Errors from a defectiveness ledger backend.
///
/// A missing entry is never an error; lookups return `Option`.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Query failed: {0}")]
    QueryFailed(#[from] sqlx::Error),

    #[error("Unknown failure type stored in ledger: {0}")]
    UnknownFailureType(String),

    #[error("Stored attempts value out of range: {0}")]
    InvalidAttempts(i64),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Step of an evaluation where a failure originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EvaluationStage {
    Dedup = 0,
    PrivateTrackerFilter = 1,
    ProtectedDownloadFilter = 2,
    PermittedAttempts = 3,
    Removal = 4,
}

impl EvaluationStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dedup => "dedup",
            Self::PrivateTrackerFilter => "private_tracker_filter",
            Self::ProtectedDownloadFilter => "protected_download_filter",
            Self::PermittedAttempts => "permitted_attempts",
            Self::Removal => "removal",
        }
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::PrivateTrackerFilter,
            2 => Self::ProtectedDownloadFilter,
            3 => Self::PermittedAttempts,
            4 => Self::Removal,
            _ => Self::Dedup,
        }
    }
}

impl std::fmt::Display for EvaluationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An evaluation of one (source, failure type) pair that was abandoned.
#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("Queue cleaning failed on {source_name} ({failure_type}) during {stage}: {cause}")]
    Ledger {
        source_name: String,
        failure_type: FailureType,
        stage: EvaluationStage,
        #[source]
        cause: LedgerError,
    },

    #[error("Queue cleaning panicked on {source_name} ({failure_type}) during {stage}: {message}")]
    Panicked {
        source_name: String,
        failure_type: FailureType,
        stage: EvaluationStage,
        message: String,
    },
}

impl EvaluationError {
    pub fn stage(&self) -> EvaluationStage {
        match self {
            Self::Ledger { stage, .. } | Self::Panicked { stage, .. } => *stage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let http = DomainError::Http {
            url: "http://radarr/api/v3/queue".to_string(),
            message: "connection refused".to_string(),
        };
        assert!(http.is_transient());

        let server = DomainError::Api {
            url: "http://radarr/api/v3/queue".to_string(),
            status: 503,
            body: String::new(),
        };
        assert!(server.is_transient());

        let not_found = DomainError::Api {
            url: "http://radarr/api/v3/queue/7".to_string(),
            status: 404,
            body: "NotFound".to_string(),
        };
        assert!(!not_found.is_transient());
        assert!(!DomainError::Authentication("Fails.".to_string()).is_transient());
    }

    #[test]
    fn test_evaluation_error_message_names_context() {
        let err = EvaluationError::Ledger {
            source_name: "Radarr".to_string(),
            failure_type: FailureType::Stalled,
            stage: EvaluationStage::PermittedAttempts,
            cause: LedgerError::InvalidAttempts(-4),
        };
        let msg = err.to_string();
        assert!(msg.contains("Radarr"));
        assert!(msg.contains("stalled"));
        assert!(msg.contains("permitted_attempts"));
        assert_eq!(err.stage(), EvaluationStage::PermittedAttempts);
    }

    #[test]
    fn test_stage_survives_u8_conversion() {
        for stage in [
            EvaluationStage::Dedup,
            EvaluationStage::PrivateTrackerFilter,
            EvaluationStage::ProtectedDownloadFilter,
            EvaluationStage::PermittedAttempts,
            EvaluationStage::Removal,
        ] {
            assert_eq!(EvaluationStage::from_u8(stage as u8), stage);
        }
    }
}
