use std::path::Path;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Project directory holding the database and configuration files.
pub const PROJECT_DIR: &str = ".ltd-meta";

/// Environment variable prefix; nested keys are separated by `__`.
pub const ENV_PREFIX: &str = "LTD_META_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid requests_per_second: {0}. Must be at least 1")]
    InvalidRateLimit(u32),

    #[error("Invalid burst_size: {0}. Must be at least 1")]
    InvalidBurstSize(u32),

    #[error("Invalid page_size: {0}. Must be between 1 and 1000")]
    InvalidPageSize(u32),

    #[error("Invalid max_retries: {0}. Cannot be 0")]
    InvalidMaxRetries(u32),

    #[error(
        "Invalid backoff configuration: initial_backoff_ms ({0}) must be less than max_backoff_ms ({1})"
    )]
    InvalidBackoff(u64, u64),

    #[error("Invalid workers: {0}. Must be between 1 and 64")]
    InvalidWorkers(usize),

    #[error("Invalid leak_scaler: {0}. Must be finite and non-negative")]
    InvalidLeakScaler(f64),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults
    /// 2. .ltd-meta/config.yaml (created by init)
    /// 3. .ltd-meta/local.yaml (optional local overrides)
    /// 4. Environment variables (LTD_META_* prefix)
    pub fn load() -> Result<Config> {
        let config: Config = Self::figment(Path::new(PROJECT_DIR))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, still honoring the environment
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.as_ref().display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    fn figment(project_dir: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(project_dir.join("config.yaml")))
            .merge(Yaml::file(project_dir.join("local.yaml")))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }
        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(config.database.max_connections));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }
        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        if config.api.requests_per_second == 0 {
            return Err(ConfigError::InvalidRateLimit(config.api.requests_per_second));
        }
        if config.api.burst_size == 0 {
            return Err(ConfigError::InvalidBurstSize(config.api.burst_size));
        }
        if config.api.page_size == 0 || config.api.page_size > 1000 {
            return Err(ConfigError::InvalidPageSize(config.api.page_size));
        }

        if config.retry.max_retries == 0 {
            return Err(ConfigError::InvalidMaxRetries(config.retry.max_retries));
        }
        if config.retry.initial_backoff_ms >= config.retry.max_backoff_ms {
            return Err(ConfigError::InvalidBackoff(
                config.retry.initial_backoff_ms,
                config.retry.max_backoff_ms,
            ));
        }

        if config.ingest.workers == 0 || config.ingest.workers > 64 {
            return Err(ConfigError::InvalidWorkers(config.ingest.workers));
        }
        if config.ingest.creatures_per_wave == 0 {
            return Err(ConfigError::ValidationFailed(
                "creatures_per_wave must be at least 1".to_string(),
            ));
        }
        for rule in &config.ingest.incubators {
            if rule.unit_id.is_empty() || rule.matured_unit_id.is_empty() {
                return Err(ConfigError::ValidationFailed(
                    "Incubator rules need both unit_id and matured_unit_id".to_string(),
                ));
            }
        }

        let scaler = config.scoring.leak_scaler;
        if !scaler.is_finite() || scaler < 0.0 {
            return Err(ConfigError::InvalidLeakScaler(scaler));
        }
        if config.scoring.max_results == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_results must be at least 1".to_string(),
            ));
        }

        if config.guides.candidates_per_wave == 0 {
            return Err(ConfigError::ValidationFailed(
                "candidates_per_wave must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
