//! Common test utilities for integration tests
//!
//! Provides shared fixtures and helpers used across multiple integration
//! test files.

use std::sync::Arc;

use focus_harness::adapters::scripted::ScriptedSessionFactory;
use focus_harness::application::ScenarioRunner;
use focus_harness::domain::models::{Config, RunContext};

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
/// Call this at the beginning of tests that need logging.
#[allow(dead_code)]
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Every engine in both headless and headed mode.
#[allow(dead_code)]
pub fn all_contexts() -> Vec<RunContext> {
    focus_harness::domain::models::Engine::ALL
        .into_iter()
        .flat_map(|engine| [RunContext::headless(engine), RunContext::headed(engine)])
        .collect()
}

/// Runner over the built-in scripted engine for `context`.
#[allow(dead_code)]
pub fn scripted_runner(context: RunContext) -> (Arc<ScriptedSessionFactory>, ScenarioRunner) {
    let factory = Arc::new(ScriptedSessionFactory::new(context));
    let runner = ScenarioRunner::new(factory.clone(), &Config::default());
    (factory, runner)
}
