//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::domain::models::{Engine, ScenarioId};

#[derive(Parser, Debug)]
#[command(name = "focus-harness")]
#[command(about = "Differential focus behavior harness for browser engines", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file (default: focus-harness.yaml, then focus-harness.local.yaml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List scenarios and what each engine is expected to do
    List(ListArgs),

    /// Run scenarios on one engine and compare against expectations
    Run(RunArgs),
}

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Only show expectations for this engine
    #[arg(short, long)]
    pub engine: Option<Engine>,

    /// Show expectations for headed runs
    #[arg(long)]
    pub headed: bool,
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Engine to drive (chromium, firefox, webkit)
    #[arg(short, long)]
    pub engine: Option<Engine>,

    /// Scenario to run; repeat for several (default: all)
    #[arg(short, long = "scenario")]
    pub scenarios: Vec<ScenarioId>,

    /// Run with a visible window
    #[arg(long)]
    pub headed: bool,

    /// Override the per-phase iteration ceiling
    #[arg(long)]
    pub max_iterations: Option<u32>,

    /// Override the scenario deadline in milliseconds
    #[arg(long)]
    pub deadline_ms: Option<u64>,

    /// YAML engine script replacing the built-in engine behavior
    #[arg(long)]
    pub script: Option<PathBuf>,
}
