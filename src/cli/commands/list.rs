//! Implementation of the `focus-harness list` command.

use anyhow::Result;
use serde::Serialize;

use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::cli::types::ListArgs;
use crate::domain::models::{Engine, Expectation, Fixture, RunContext, ScenarioId};
use crate::services::{scenario_catalog, ExpectationMatrix};

#[derive(Debug, Clone, Serialize)]
pub struct ExpectationEntry {
    pub scenario: ScenarioId,
    pub fixture: Fixture,
    pub context: RunContext,
    pub converges: bool,
    pub summary: String,
    pub expectation: Expectation,
}

#[derive(Debug, Serialize)]
pub struct ListOutput {
    pub entries: Vec<ExpectationEntry>,
}

impl CommandOutput for ListOutput {
    fn to_human(&self) -> String {
        if self.entries.is_empty() {
            return "No expectations recorded.".to_string();
        }
        TableFormatter::new().format_expectations(&self.entries)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

fn summarize(expectation: &Expectation) -> String {
    match expectation {
        Expectation::NonConvergent => "does not converge".to_string(),
        Expectation::Exact { trace, log: None } => {
            format!("converges, {} snapshots", trace.len())
        }
        Expectation::Exact {
            trace,
            log: Some(log),
        } => format!(
            "converges, {} snapshots, {} log lines",
            trace.len(),
            log.len()
        ),
    }
}

/// Build the listing for the selected engines.
pub fn entries(engine: Option<Engine>, headless: bool) -> Vec<ExpectationEntry> {
    let matrix = ExpectationMatrix::builtin();
    let engines: Vec<Engine> = engine.map_or_else(|| Engine::ALL.to_vec(), |engine| vec![engine]);

    let mut entries = Vec::new();
    for plan in scenario_catalog::all_plans() {
        for &engine in &engines {
            let context = RunContext { engine, headless };
            if let Some(expectation) = matrix.lookup(context, plan.id) {
                entries.push(ExpectationEntry {
                    scenario: plan.id,
                    fixture: plan.fixture,
                    context,
                    converges: !matches!(expectation, Expectation::NonConvergent),
                    summary: summarize(expectation),
                    expectation: expectation.clone(),
                });
            }
        }
    }
    entries
}

pub fn execute(args: &ListArgs, json_mode: bool) -> Result<()> {
    let result = ListOutput {
        entries: entries(args.engine, !args.headed),
    };
    output(&result, json_mode);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_cover_every_scenario_for_one_engine() {
        let listed = entries(Some(Engine::Webkit), true);
        assert_eq!(listed.len(), ScenarioId::ALL.len());
        assert!(listed.iter().all(|entry| entry.context.engine == Engine::Webkit));

        let stalled: Vec<_> = listed
            .iter()
            .filter(|entry| !entry.converges)
            .map(|entry| entry.scenario)
            .collect();
        assert_eq!(
            stalled,
            vec![ScenarioId::TabbingInIframe, ScenarioId::ShiftTabbingInIframe]
        );
    }

    #[test]
    fn test_summary_mentions_log_lines_when_asserted() {
        let listed = entries(Some(Engine::Chromium), true);
        let tabbing = &listed[0];
        assert_eq!(tabbing.summary, "converges, 5 snapshots");
        let in_iframe = listed
            .iter()
            .find(|entry| entry.scenario == ScenarioId::TabbingInIframe)
            .unwrap();
        assert_eq!(in_iframe.summary, "converges, 3 snapshots, 9 log lines");
    }
}
