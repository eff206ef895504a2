//! Custom engine scripts loaded from YAML replace the built-in behavior.

use std::sync::Arc;

use focus_harness::adapters::scripted::{profiles, ScriptFile, ScriptedSessionFactory};
use focus_harness::application::{ScenarioRunner, Verdict};
use focus_harness::domain::models::{
    Config, Engine, Fixture, Mismatch, RunContext, ScenarioId,
};
use focus_harness::services::scenario_catalog;

#[tokio::test]
async fn test_builtin_script_survives_a_yaml_round_trip() {
    let context = RunContext::headless(Engine::Chromium);
    let file = ScriptFile {
        scripts: vec![profiles::builtin(context, Fixture::NestedFrame)],
    };
    let text = serde_yaml::to_string(&file).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("engines.yaml");
    std::fs::write(&path, text).unwrap();
    let loaded = ScriptFile::load(&path).unwrap();

    let factory = Arc::new(ScriptedSessionFactory::new(context).with_scripts(loaded.scripts));
    let runner = ScenarioRunner::new(factory, &Config::default());
    let report = runner
        .run(&scenario_catalog::plan(ScenarioId::ClickToRestoreFocus))
        .await;
    assert!(report.verdict.is_pass(), "{:?}", report.verdict);
}

#[tokio::test]
async fn test_script_with_extra_log_line_fails_on_the_log() {
    let context = RunContext::headless(Engine::Webkit);
    let mut script = profiles::builtin(context, Fixture::NestedFrame);
    let outside = script.states.get_mut("outside-1").unwrap();
    for transition in &mut outside.on {
        transition.logs.push("unexpected".to_string());
    }

    let factory = Arc::new(ScriptedSessionFactory::new(context).with_scripts(vec![script]));
    let runner = ScenarioRunner::new(factory, &Config::default());
    let report = runner
        .run(&scenario_catalog::plan(ScenarioId::ClickToRestoreFocus))
        .await;

    let Verdict::Failed { mismatch } = report.verdict else {
        panic!("expected a log mismatch, got {:?}", report.verdict);
    };
    assert_eq!(
        mismatch,
        Mismatch::Log {
            index: 7,
            expected: None,
            actual: Some("unexpected".to_string()),
        }
    );
}
