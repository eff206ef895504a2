use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use std::path::Path;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Project configuration file, created by hand next to the suite
pub const CONFIG_FILE: &str = "focus-harness.yaml";

/// Optional local overrides, typically git-ignored
pub const LOCAL_CONFIG_FILE: &str = "focus-harness.local.yaml";

/// Prefix for environment overrides, e.g. `FOCUS_HARNESS_CONVERGENCE__MAX_ITERATIONS`
pub const ENV_PREFIX: &str = "FOCUS_HARNESS_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid max_iterations: {0}. Must be at least 1")]
    InvalidMaxIterations(u32),

    #[error("Invalid deadline_ms: {0}. Must be positive")]
    InvalidDeadline(u64),

    #[error("Invalid sample_grace_ms: {0}. Must be positive")]
    InvalidSampleGrace(u64),

    #[error("Invalid log_drain_timeout_ms: {0}. Must be positive")]
    InvalidLogDrainTimeout(u64),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidRotation(String),

    #[error("Engine script not found: {0}")]
    MissingScript(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. focus-harness.yaml in the working directory
    /// 3. focus-harness.local.yaml (optional overrides)
    /// 4. Environment variables (FOCUS_HARNESS_* prefix, highest priority)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(CONFIG_FILE))
            .merge(Yaml::file(LOCAL_CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, still honoring environment overrides
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.convergence.max_iterations == 0 {
            return Err(ConfigError::InvalidMaxIterations(
                config.convergence.max_iterations,
            ));
        }

        if config.convergence.deadline_ms == 0 {
            return Err(ConfigError::InvalidDeadline(config.convergence.deadline_ms));
        }

        if config.convergence.sample_grace_ms == 0 {
            return Err(ConfigError::InvalidSampleGrace(
                config.convergence.sample_grace_ms,
            ));
        }

        if config.log_drain_timeout_ms == 0 {
            return Err(ConfigError::InvalidLogDrainTimeout(config.log_drain_timeout_ms));
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

        if let Some(script) = &config.script_path {
            if !script.exists() {
                return Err(ConfigError::MissingScript(script.display().to_string()));
            }
        }

        Ok(())
    }
}
