//! focus-harness - differential focus behavior testing across browser engines
//!
//! Drives Tab, Shift+Tab and clicks through a page with three inputs, either
//! directly in the document or inside a nested iframe, and records what the
//! engine reports after every action. The recorded trace and event log are
//! compared against a per-engine expectation table, so divergent and even
//! non-terminating engine behavior is documented rather than papered over.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): snapshots, scenarios, outcomes and the port traits
//! - **Service Layer** (`services`): sampler, log collector, convergence loop,
//!   expectation matrix, comparator and the scenario catalog
//! - **Application Layer** (`application`): scenario runner
//! - **Adapters** (`adapters`): scripted engines implementing the ports
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use focus_harness::adapters::scripted::ScriptedSessionFactory;
//! use focus_harness::application::ScenarioRunner;
//! use focus_harness::domain::models::{Config, Engine, RunContext};
//! use focus_harness::services::scenario_catalog;
//!
//! # async fn demo() {
//! let factory = Arc::new(ScriptedSessionFactory::new(RunContext::headless(Engine::Webkit)));
//! let runner = ScenarioRunner::new(factory, &Config::default());
//! let suite = runner.run_all(&scenario_catalog::all_plans()).await;
//! assert!(suite.all_passed());
//! # }
//! ```

pub mod adapters;
pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use application::{ScenarioReport, ScenarioRunner, SuiteReport, Verdict};
pub use domain::models::{
    Config, Engine, EventLog, Expectation, FocusSnapshot, Mismatch, RunContext, ScenarioId,
    ScenarioOutcome, ScenarioResult, Trace,
};
pub use domain::{HarnessError, HarnessResult};
