use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::engine::{Engine, RunContext};
use super::scenario::ScenarioId;

/// Main configuration structure for focus-harness
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Engine driven by this run
    #[serde(default = "default_engine")]
    pub engine: Engine,

    /// Whether the engine runs without a visible window
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Scenarios to run (empty runs the whole suite)
    #[serde(default)]
    pub scenarios: Vec<ScenarioId>,

    /// Convergence loop bounds
    #[serde(default)]
    pub convergence: ConvergenceConfig,

    /// How long to wait for the log stream to drain after a scenario
    #[serde(default = "default_log_drain_timeout_ms")]
    pub log_drain_timeout_ms: u64,

    /// YAML engine script replacing the built-in engine behavior
    #[serde(default)]
    pub script_path: Option<PathBuf>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

const fn default_engine() -> Engine {
    Engine::Chromium
}

const fn default_headless() -> bool {
    true
}

const fn default_log_drain_timeout_ms() -> u64 {
    500
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: default_engine(),
            headless: default_headless(),
            scenarios: Vec::new(),
            convergence: ConvergenceConfig::default(),
            log_drain_timeout_ms: default_log_drain_timeout_ms(),
            script_path: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    pub const fn run_context(&self) -> RunContext {
        RunContext {
            engine: self.engine,
            headless: self.headless,
        }
    }

    pub const fn log_drain_timeout(&self) -> Duration {
        Duration::from_millis(self.log_drain_timeout_ms)
    }

    /// Configured scenarios, or every scenario when none are named.
    pub fn selected_scenarios(&self) -> Vec<ScenarioId> {
        if self.scenarios.is_empty() {
            ScenarioId::ALL.to_vec()
        } else {
            self.scenarios.clone()
        }
    }
}

/// Bounds on the convergence loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ConvergenceConfig {
    /// Maximum actions issued by a single converge phase
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Wall-clock budget for the whole traced part of a scenario
    #[serde(default = "default_deadline_ms")]
    pub deadline_ms: u64,

    /// Extra time allowed for the snapshot of an already delivered action
    #[serde(default = "default_sample_grace_ms")]
    pub sample_grace_ms: u64,
}

const fn default_max_iterations() -> u32 {
    16
}

const fn default_deadline_ms() -> u64 {
    5_000
}

const fn default_sample_grace_ms() -> u64 {
    1_000
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            deadline_ms: default_deadline_ms(),
            sample_grace_ms: default_sample_grace_ms(),
        }
    }
}

impl ConvergenceConfig {
    pub const fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }

    pub const fn sample_grace(&self) -> Duration {
        Duration::from_millis(self.sample_grace_ms)
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

    /// Directory for rolling log files (stderr only when unset)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Rotation for file output: daily, hourly or never
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
