use serde::{Deserialize, Serialize};
use std::fmt;

/// The *arr applications whose queues can be swept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Radarr,
    Sonarr,
    Lidarr,
    Readarr,
    Whisparr,
}

impl SourceKind {
    pub const ALL: [Self; 5] = [
        Self::Radarr,
        Self::Sonarr,
        Self::Lidarr,
        Self::Readarr,
        Self::Whisparr,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Radarr => "Radarr",
            Self::Sonarr => "Sonarr",
            Self::Lidarr => "Lidarr",
            Self::Readarr => "Readarr",
            Self::Whisparr => "Whisparr",
        }
    }

    /// Path suffix of the REST API this app version serves.
    pub fn api_path(&self) -> &'static str {
        match self {
            Self::Radarr | Self::Sonarr | Self::Whisparr => "/api/v3",
            Self::Lidarr | Self::Readarr => "/api/v1",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A configured source application, with its API base URL resolved.
#[derive(Clone, PartialEq, Eq)]
pub struct SourceInstance {
    pub kind: SourceKind,
    /// e.g. `http://radarr:7878/api/v3`; also the ledger partition key.
    pub base_url: String,
    pub api_key: String,
}

impl SourceInstance {
    /// Build an instance from a user-supplied URL such as `http://radarr:7878/`.
    pub fn new(kind: SourceKind, url: &str, api_key: impl Into<String>) -> Self {
        Self {
            kind,
            base_url: format!("{}{}", url.trim_end_matches('/'), kind.api_path()),
            api_key: api_key.into(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }
}

impl fmt::Debug for SourceInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceInstance")
            .field("kind", &self.kind)
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}
