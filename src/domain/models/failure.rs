//! Failure types and the checks applied to each of them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A category of defect with its own attempt accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureType {
    /// The download client reports the download as failed.
    Failed,
    /// The download finished but the *arr app could not import it.
    FailedImport,
    /// The torrent never got past fetching its metadata.
    MetadataMissing,
    /// The files of the download are gone from disk.
    MissingFiles,
    /// The download has no connections and makes no progress.
    Stalled,
}

impl FailureType {
    pub const ALL: [Self; 5] = [
        Self::Failed,
        Self::FailedImport,
        Self::MetadataMissing,
        Self::MissingFiles,
        Self::Stalled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Failed => "failed",
            Self::FailedImport => "failed_import",
            Self::MetadataMissing => "metadata_missing",
            Self::MissingFiles => "missing_files",
            Self::Stalled => "stalled",
        }
    }

    /// Checks applied before removing items of this type.
    ///
    /// One-shot conditions (failed, missing files, failed imports) skip
    /// attempt accounting. Failed imports keep private torrents seeding.
    pub fn default_checks(&self) -> CheckOptions {
        match self {
            Self::Failed => CheckOptions {
                private_tracker_check: false,
                protected_download_check: true,
                permitted_attempts_check: false,
                add_to_blocklist: true,
                keep_torrent_for_private_trackers: false,
            },
            Self::FailedImport => CheckOptions {
                private_tracker_check: false,
                protected_download_check: true,
                permitted_attempts_check: false,
                add_to_blocklist: true,
                keep_torrent_for_private_trackers: true,
            },
            Self::MetadataMissing | Self::Stalled => CheckOptions {
                private_tracker_check: true,
                protected_download_check: true,
                permitted_attempts_check: true,
                add_to_blocklist: true,
                keep_torrent_for_private_trackers: false,
            },
            Self::MissingFiles => CheckOptions {
                private_tracker_check: false,
                protected_download_check: true,
                permitted_attempts_check: false,
                add_to_blocklist: false,
                keep_torrent_for_private_trackers: false,
            },
        }
    }
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FailureType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown failure type: {s}"))
    }
}

/// Which filters run for one evaluation, and how survivors are removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckOptions {
    pub private_tracker_check: bool,
    pub protected_download_check: bool,
    pub permitted_attempts_check: bool,
    pub add_to_blocklist: bool,
    /// Remove the queue entry but leave the torrent in the client when the
    /// download comes from a private tracker.
    pub keep_torrent_for_private_trackers: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_names() {
        for failure_type in FailureType::ALL {
            assert_eq!(failure_type.as_str().parse::<FailureType>(), Ok(failure_type));
        }
        assert!("slow".parse::<FailureType>().is_err());
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&FailureType::MetadataMissing).unwrap();
        assert_eq!(json, "\"metadata_missing\"");
    }

    #[test]
    fn test_attempt_accounting_only_for_lingering_states() {
        let counted: Vec<_> = FailureType::ALL
            .into_iter()
            .filter(|t| t.default_checks().permitted_attempts_check)
            .collect();
        assert_eq!(counted, vec![FailureType::MetadataMissing, FailureType::Stalled]);
    }

    #[test]
    fn test_failed_import_keeps_private_torrents() {
        let checks = FailureType::FailedImport.default_checks();
        assert!(checks.keep_torrent_for_private_trackers);
        assert!(checks.add_to_blocklist);
        assert!(!FailureType::MissingFiles.default_checks().add_to_blocklist);
    }
}
