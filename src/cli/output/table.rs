//! Table output formatting for CLI commands
//!
//! Provides formatted tables for expectation listings and suite results using
//! comfy-table. Colors are dropped when NO_COLOR is set or the terminal is dumb.

use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use std::env;

use crate::application::{SuiteReport, Verdict};
use crate::cli::commands::list::ExpectationEntry;

/// Table formatter for CLI output
pub struct TableFormatter {
    /// Whether to use colors in output
    use_colors: bool,
    /// Maximum width for tables (None = auto)
    max_width: Option<u16>,
}

impl TableFormatter {
    /// Create a new table formatter
    pub fn new() -> Self {
        Self {
            use_colors: supports_color(),
            max_width: None,
        }
    }

    /// Create a new table formatter with custom settings
    pub const fn with_config(use_colors: bool, max_width: Option<u16>) -> Self {
        Self {
            use_colors,
            max_width,
        }
    }

    /// Format the expectation matrix rows
    pub fn format_expectations(&self, entries: &[ExpectationEntry]) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&["Scenario", "Fixture", "Engine", "Expected"]));

        for entry in entries {
            let expected = if self.use_colors && !entry.converges {
                Cell::new(&entry.summary).fg(Color::Yellow)
            } else {
                Cell::new(&entry.summary)
            };
            table.add_row(vec![
                Cell::new(entry.scenario),
                Cell::new(entry.fixture),
                Cell::new(entry.context),
                expected,
            ]);
        }

        table.to_string()
    }

    /// Format one row per scenario of a suite run
    pub fn format_suite(&self, suite: &SuiteReport) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&[
            "Scenario", "Outcome", "Snapshots", "Log lines", "Time", "Verdict",
        ]));

        for report in &suite.scenarios {
            let (outcome, snapshots, lines) = match (&report.result, &report.verdict) {
                (Some(result), _) => (
                    result.outcome.kind().to_string(),
                    result.trace.len(),
                    result.log.len(),
                ),
                (None, Verdict::Aborted { trace, log, .. }) => {
                    ("-".to_string(), trace.len(), log.len())
                }
                (None, _) => ("-".to_string(), 0, 0),
            };

            let verdict = if self.use_colors {
                Cell::new(report.verdict.label()).fg(verdict_color(&report.verdict))
            } else {
                Cell::new(format!(
                    "{} {}",
                    verdict_icon(&report.verdict),
                    report.verdict.label()
                ))
            };

            table.add_row(vec![
                Cell::new(report.scenario),
                Cell::new(outcome),
                Cell::new(snapshots),
                Cell::new(lines),
                Cell::new(format!("{}ms", report.duration_ms)),
                verdict,
            ]);
        }

        table.to_string()
    }

    fn create_base_table(&self) -> Table {
        let mut table = Table::new();

        // Use UTF-8 preset for nice borders
        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        if let Some(width) = self.max_width {
            table.set_width(width);
        }

        table
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn header(titles: &[&str]) -> Vec<Cell> {
    titles
        .iter()
        .map(|title| Cell::new(title).add_attribute(Attribute::Bold))
        .collect()
}

/// Check if the terminal supports colors
fn supports_color() -> bool {
    // Respect NO_COLOR environment variable
    if env::var("NO_COLOR").is_ok() {
        return false;
    }

    if let Ok(term) = env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    true
}

const fn verdict_color(verdict: &Verdict) -> Color {
    match verdict {
        Verdict::Passed => Color::Green,
        Verdict::Failed { .. } => Color::Red,
        Verdict::Aborted { .. } => Color::Magenta,
    }
}

const fn verdict_icon(verdict: &Verdict) -> &'static str {
    match verdict {
        Verdict::Passed => "✓",
        Verdict::Failed { .. } => "✗",
        Verdict::Aborted { .. } => "!",
    }
}
