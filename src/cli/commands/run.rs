//! Implementation of the `focus-harness run` command.

use anyhow::{Context, Result};
use console::style;
use serde::Serialize;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::info;

use crate::adapters::scripted::{ScriptFile, ScriptedSessionFactory};
use crate::application::{ScenarioRunner, SuiteReport, Verdict};
use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::cli::types::RunArgs;
use crate::domain::models::Config;
use crate::infrastructure::config::ConfigLoader;
use crate::services::scenario_catalog;

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct RunOutput {
    pub suite: SuiteReport,
}

impl CommandOutput for RunOutput {
    fn to_human(&self) -> String {
        let suite = &self.suite;
        let mut text = format!("Engine: {}\n", suite.context);
        text.push_str(&TableFormatter::new().format_suite(suite));
        text.push('\n');

        for report in &suite.scenarios {
            match &report.verdict {
                Verdict::Passed => {}
                Verdict::Failed { mismatch } => {
                    let _ = writeln!(text, "\n{}: {mismatch}", style(report.scenario).red().bold());
                }
                Verdict::Aborted { error, trace, .. } => {
                    let _ = writeln!(
                        text,
                        "\n{}: {error} (after {} snapshots)",
                        style(report.scenario).magenta().bold(),
                        trace.len()
                    );
                }
            }
            for anomaly in &report.anomalies {
                let _ = writeln!(text, "  {} {anomaly}", style("anomaly").yellow());
            }
        }

        let summary = format!(
            "{} passed, {} failed, {} aborted in {}ms",
            suite.passed(),
            suite.failed(),
            suite.aborted(),
            suite.duration_ms
        );
        let summary = if suite.all_passed() {
            style(summary).green()
        } else {
            style(summary).red()
        };
        let _ = write!(text, "\n{summary}");
        text
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Fold command-line overrides into the loaded configuration.
pub fn apply_overrides(mut config: Config, args: &RunArgs) -> Config {
    if let Some(engine) = args.engine {
        config.engine = engine;
    }
    if args.headed {
        config.headless = false;
    }
    if !args.scenarios.is_empty() {
        config.scenarios.clone_from(&args.scenarios);
    }
    if let Some(max_iterations) = args.max_iterations {
        config.convergence.max_iterations = max_iterations;
    }
    if let Some(deadline_ms) = args.deadline_ms {
        config.convergence.deadline_ms = deadline_ms;
    }
    if let Some(script) = &args.script {
        config.script_path = Some(script.clone());
    }
    config
}

/// Run the selected scenarios and report. Returns the suite so the caller
/// can choose an exit status.
pub async fn run_suite(config: &Config) -> Result<SuiteReport> {
    ConfigLoader::validate(config)?;

    let scripts = match &config.script_path {
        Some(path) => {
            ScriptFile::load(path)
                .with_context(|| format!("Failed to load engine script {}", path.display()))?
                .scripts
        }
        None => Vec::new(),
    };

    let context = config.run_context();
    let factory = Arc::new(ScriptedSessionFactory::new(context).with_scripts(scripts));
    let runner = ScenarioRunner::new(factory, config);

    let plans: Vec<_> = config
        .selected_scenarios()
        .into_iter()
        .map(scenario_catalog::plan)
        .collect();
    info!(%context, scenarios = plans.len(), "Starting suite");

    Ok(runner.run_all(&plans).await)
}

pub async fn execute(args: &RunArgs, config: Config, json_mode: bool) -> Result<bool> {
    let config = apply_overrides(config, args);
    let suite = run_suite(&config).await?;
    let passed = suite.all_passed();
    output(&RunOutput { suite }, json_mode);
    Ok(passed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Engine, ScenarioId};

    #[test]
    fn test_overrides_take_precedence() {
        let args = RunArgs {
            engine: Some(Engine::Firefox),
            scenarios: vec![ScenarioId::ClickToRestoreFocus],
            headed: true,
            max_iterations: Some(3),
            ..RunArgs::default()
        };
        let config = apply_overrides(Config::default(), &args);
        assert_eq!(config.engine, Engine::Firefox);
        assert!(!config.headless);
        assert_eq!(config.selected_scenarios(), vec![ScenarioId::ClickToRestoreFocus]);
        assert_eq!(config.convergence.max_iterations, 3);
        assert_eq!(config.convergence.deadline_ms, 5_000);
    }

    #[tokio::test]
    async fn test_run_suite_rejects_invalid_bounds() {
        let mut config = Config::default();
        config.convergence.max_iterations = 0;
        assert!(run_suite(&config).await.is_err());
    }

    #[tokio::test]
    async fn test_run_suite_on_selected_scenario() {
        let config = apply_overrides(
            Config::default(),
            &RunArgs {
                engine: Some(Engine::Webkit),
                scenarios: vec![ScenarioId::ShiftTabbing],
                ..RunArgs::default()
            },
        );
        let suite = run_suite(&config).await.unwrap();
        assert_eq!(suite.scenarios.len(), 1);
        assert!(suite.all_passed());
    }
}
