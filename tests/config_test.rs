//! Configuration loading through figment with file and environment layers.

use focus_harness::domain::models::{Engine, ScenarioId};
use focus_harness::infrastructure::config::ConfigLoader;
use std::fs;

const CONFIG: &str = r"
engine: firefox
headless: false
scenarios: [click-to-restore-focus]
convergence:
  max_iterations: 6
  deadline_ms: 2000
logging:
  level: warn
";

#[test]
fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("focus-harness.yaml");
    fs::write(&path, CONFIG).unwrap();

    let config = temp_env::with_vars_unset(
        ["FOCUS_HARNESS_ENGINE", "FOCUS_HARNESS_CONVERGENCE__MAX_ITERATIONS"],
        || ConfigLoader::load_from_file(&path),
    )
    .unwrap();

    assert_eq!(config.engine, Engine::Firefox);
    assert!(!config.headless);
    assert_eq!(config.selected_scenarios(), vec![ScenarioId::ClickToRestoreFocus]);
    assert_eq!(config.convergence.max_iterations, 6);
    assert_eq!(config.convergence.deadline_ms, 2_000);
    assert_eq!(config.logging.level, "warn");
    assert_eq!(config.log_drain_timeout_ms, 500);
}

#[test]
fn test_environment_overrides_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("focus-harness.yaml");
    fs::write(&path, CONFIG).unwrap();

    let config = temp_env::with_vars(
        [
            ("FOCUS_HARNESS_ENGINE", Some("webkit")),
            ("FOCUS_HARNESS_CONVERGENCE__MAX_ITERATIONS", Some("3")),
        ],
        || ConfigLoader::load_from_file(&path),
    )
    .unwrap();

    assert_eq!(config.engine, Engine::Webkit);
    assert_eq!(config.convergence.max_iterations, 3);
    assert_eq!(config.convergence.deadline_ms, 2_000);
}

#[test]
fn test_invalid_values_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("focus-harness.yaml");
    fs::write(&path, "convergence:\n  max_iterations: 0\n").unwrap();

    let err = temp_env::with_var_unset("FOCUS_HARNESS_CONVERGENCE__MAX_ITERATIONS", || {
        ConfigLoader::load_from_file(&path)
    })
    .unwrap_err();
    assert!(err.to_string().contains("max_iterations"), "{err:#}");
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(ConfigLoader::load_from_file(dir.path().join("absent.yaml")).is_err());
}
