use serde::{Deserialize, Serialize};
use std::fmt;

use super::{FailureType, SourceInstance, SourceKind};

/// Main configuration structure for the queue sweeper
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// General behaviour
    #[serde(default)]
    pub general: GeneralConfig,

    /// Which failure types are swept, and how often
    #[serde(default)]
    pub features: FeaturesConfig,

    /// Thresholds and exemptions shared by all failure types
    #[serde(default)]
    pub feature_settings: FeatureSettings,

    /// *arr applications to monitor
    #[serde(default)]
    pub sources: SourcesConfig,

    /// qBittorrent connection (optional)
    #[serde(default)]
    pub qbittorrent: QbittorrentConfig,

    /// Retry policy for queue fetches
    #[serde(default)]
    pub retry: RetryConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Defectiveness ledger storage
    #[serde(default)]
    pub ledger: LedgerConfig,
}

impl Config {
    /// Configured sources with their API base URLs resolved.
    pub fn source_instances(&self) -> Vec<SourceInstance> {
        SourceKind::ALL
            .into_iter()
            .filter_map(|kind| {
                self.sources
                    .get(kind)
                    .map(|app| SourceInstance::new(kind, &app.url, app.key.clone()))
            })
            .collect()
    }

    /// qBittorrent API base URL, or `None` when no torrent client is configured.
    pub fn qbittorrent_api_url(&self) -> Option<String> {
        let url = self.qbittorrent.url.trim();
        if url.is_empty() {
            None
        } else {
            Some(format!("{}/api/v2", url.trim_end_matches('/')))
        }
    }

    /// Copy with API keys and passwords masked, for display.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        for app in [
            &mut config.sources.radarr,
            &mut config.sources.sonarr,
            &mut config.sources.lidarr,
            &mut config.sources.readarr,
            &mut config.sources.whisparr,
        ]
        .into_iter()
        .flatten()
        {
            app.key = REDACTED.to_string();
        }
        if !config.qbittorrent.password.is_empty() {
            config.qbittorrent.password = REDACTED.to_string();
        }
        config
    }
}

const REDACTED: &str = "[REDACTED]";

/// General configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GeneralConfig {
    /// Compute removals without calling the source applications
    #[serde(default)]
    pub test_run: bool,

    /// Verify TLS certificates of the source applications
    #[serde(default = "default_true")]
    pub ssl_verification: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            test_run: false,
            ssl_verification: true,
        }
    }
}

/// Feature toggles
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FeaturesConfig {
    /// Minutes between sweep cycles
    #[serde(default = "default_remove_timer")]
    pub remove_timer: f64,

    #[serde(default)]
    pub remove_failed: bool,

    #[serde(default)]
    pub remove_failed_imports: bool,

    #[serde(default)]
    pub remove_metadata_missing: bool,

    #[serde(default)]
    pub remove_missing_files: bool,

    #[serde(default)]
    pub remove_stalled: bool,
}

impl FeaturesConfig {
    pub fn is_enabled(&self, failure_type: FailureType) -> bool {
        match failure_type {
            FailureType::Failed => self.remove_failed,
            FailureType::FailedImport => self.remove_failed_imports,
            FailureType::MetadataMissing => self.remove_metadata_missing,
            FailureType::MissingFiles => self.remove_missing_files,
            FailureType::Stalled => self.remove_stalled,
        }
    }

    /// Enabled failure types in evaluation order.
    pub fn enabled_failure_types(&self) -> Vec<FailureType> {
        FailureType::ALL
            .into_iter()
            .filter(|t| self.is_enabled(*t))
            .collect()
    }
}

const fn default_remove_timer() -> f64 {
    10.0
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            remove_timer: default_remove_timer(),
            remove_failed: false,
            remove_failed_imports: false,
            remove_metadata_missing: false,
            remove_missing_files: false,
            remove_stalled: false,
        }
    }
}

/// Settings shared by the checks
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FeatureSettings {
    /// Consecutive defective observations tolerated before removal
    #[serde(default = "default_permitted_attempts")]
    pub permitted_attempts: u32,

    /// qBittorrent tag marking downloads that must never be removed
    #[serde(default = "default_protection_tag")]
    pub no_stalled_removal_qbit_tag: String,

    /// Exempt private-tracker downloads from lingering-state checks
    #[serde(default = "default_true")]
    pub ignore_private_trackers: bool,

    /// Only failed imports whose status messages contain one of these are removed
    #[serde(default)]
    pub failed_import_message_patterns: Vec<String>,

    /// Queue items handled by these download clients are never touched
    #[serde(default)]
    pub ignored_download_clients: Vec<String>,
}

const fn default_permitted_attempts() -> u32 {
    3
}

fn default_protection_tag() -> String {
    "Don't Kill".to_string()
}

const fn default_true() -> bool {
    true
}

impl Default for FeatureSettings {
    fn default() -> Self {
        Self {
            permitted_attempts: default_permitted_attempts(),
            no_stalled_removal_qbit_tag: default_protection_tag(),
            ignore_private_trackers: true,
            failed_import_message_patterns: Vec::new(),
            ignored_download_clients: Vec::new(),
        }
    }
}

/// Connection settings of one *arr application
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrAppConfig {
    pub url: String,
    pub key: String,
}

impl fmt::Debug for ArrAppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrAppConfig")
            .field("url", &self.url)
            .field("key", &REDACTED)
            .finish()
    }
}

/// Monitored *arr applications
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SourcesConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radarr: Option<ArrAppConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sonarr: Option<ArrAppConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lidarr: Option<ArrAppConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readarr: Option<ArrAppConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whisparr: Option<ArrAppConfig>,
}

impl SourcesConfig {
    pub fn get(&self, kind: SourceKind) -> Option<&ArrAppConfig> {
        match kind {
            SourceKind::Radarr => self.radarr.as_ref(),
            SourceKind::Sonarr => self.sonarr.as_ref(),
            SourceKind::Lidarr => self.lidarr.as_ref(),
            SourceKind::Readarr => self.readarr.as_ref(),
            SourceKind::Whisparr => self.whisparr.as_ref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        SourceKind::ALL.into_iter().all(|kind| self.get(kind).is_none())
    }
}

/// qBittorrent connection settings
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct QbittorrentConfig {
    /// Web UI URL, empty when no torrent client is used
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl fmt::Debug for QbittorrentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QbittorrentConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &REDACTED)
            .finish()
    }
}

/// Retry policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial backoff delay in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Maximum backoff delay in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

const fn default_max_retries() -> u32 {
    2
}

const fn default_initial_backoff_ms() -> u64 {
    1000
}

const fn default_max_backoff_ms() -> u64 {
    10_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rotated log files; stdout only when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,

    /// Rotation of log files: daily, hourly or never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}

/// Backend of the defectiveness ledger
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerBackend {
    /// Attempts are forgotten when the process exits
    #[default]
    Memory,
    /// Attempts survive restarts in a SQLite database
    Sqlite,
}

/// Ledger storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LedgerConfig {
    #[serde(default)]
    pub backend: LedgerBackend,

    /// Path to the SQLite database file
    #[serde(default = "default_ledger_path")]
    pub database_path: String,
}

fn default_ledger_path() -> String {
    ".queue-sweeper/ledger.db".to_string()
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            backend: LedgerBackend::default(),
            database_path: default_ledger_path(),
        }
    }
}
