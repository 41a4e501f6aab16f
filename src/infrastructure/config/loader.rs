use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::path::Path;
use thiserror::Error;

use crate::domain::models::config::{Config, LedgerBackend};
use crate::domain::models::SourceKind;

/// Default configuration file, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "queue-sweeper.yaml";

/// Prefix of environment variable overrides
pub const ENV_PREFIX: &str = "SWEEPER_";

/// Shortest sweep period a `remove_timer` may ask for, in seconds
pub const MIN_CYCLE_SECS: f64 = 1.0;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("No source configured. Set at least one of sources.radarr, sonarr, lidarr, readarr, whisparr")]
    NoSources,

    #[error("{0} url cannot be empty")]
    EmptySourceUrl(&'static str),

    #[error("{0} key cannot be empty")]
    EmptySourceKey(&'static str),

    #[error("Invalid remove_timer: {0}. Must be a finite number of minutes, at least one second")]
    InvalidRemoveTimer(f64),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidRotation(String),

    #[error("Ledger database path cannot be empty with the sqlite backend")]
    EmptyDatabasePath,

    #[error(
        "Invalid backoff configuration: initial_backoff_ms ({0}) must not exceed max_backoff_ms ({1})"
    )]
    InvalidBackoff(u64, u64),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. `queue-sweeper.yaml` in the working directory, or `path` when given
    /// 3. Environment variables (`SWEEPER_*`, nested keys split on `__`)
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let config = Self::figment(path)
            .extract::<Config>()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, without environment overrides
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    fn figment(path: Option<&Path>) -> Figment {
        let file = path.map_or_else(|| Path::new(DEFAULT_CONFIG_FILE).to_path_buf(), Path::to_path_buf);
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.sources.is_empty() {
            return Err(ConfigError::NoSources);
        }

        for kind in SourceKind::ALL {
            if let Some(app) = config.sources.get(kind) {
                if app.url.trim().is_empty() {
                    return Err(ConfigError::EmptySourceUrl(kind.name()));
                }
                if app.key.trim().is_empty() {
                    return Err(ConfigError::EmptySourceKey(kind.name()));
                }
            }
        }

        let remove_timer = config.features.remove_timer;
        if !remove_timer.is_finite() || remove_timer * 60.0 < MIN_CYCLE_SECS {
            return Err(ConfigError::InvalidRemoveTimer(remove_timer));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidRotation(config.logging.rotation.clone()));
        }

        if config.ledger.backend == LedgerBackend::Sqlite && config.ledger.database_path.trim().is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }

        if config.retry.initial_backoff_ms > config.retry.max_backoff_ms {
            return Err(ConfigError::InvalidBackoff(
                config.retry.initial_backoff_ms,
                config.retry.max_backoff_ms,
            ));
        }

        Ok(())
    }
}
