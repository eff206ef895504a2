//! Domain models for the focus harness.

pub mod config;
pub mod engine;
pub mod outcome;
pub mod scenario;
pub mod snapshot;

pub use config::{Config, ConvergenceConfig, LoggingConfig};
pub use engine::{Engine, RunContext};
pub use outcome::{
    Divergence, Expectation, Mismatch, NonConvergenceReason, OutcomeKind, ScenarioOutcome,
    ScenarioResult,
};
pub use scenario::{
    Checkpoint, DocumentRef, ElementRef, ElementTarget, Fixture, FixtureLayout, InputAction,
    Locator, MouseButton, Phase, ScenarioId, ScenarioPlan, SetupStep, StabilityPredicate,
    TrackedElement,
};
pub use snapshot::{EventLog, FocusSnapshot, SnapshotAnomaly, Trace, TrackedInput};
