pub mod scenario_runner;

pub use scenario_runner::{ScenarioReport, ScenarioRunner, SuiteReport, Verdict};
