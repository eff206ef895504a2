//! Domain errors for the focus harness.

use thiserror::Error;

use super::models::{DocumentRef, Locator};

/// Errors that abort a single scenario.
///
/// Non-convergence is deliberately absent: it is a scenario outcome, not a
/// fault. Comparator failures are reported through [`super::models::Mismatch`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HarnessError {
    #[error("Tracked element {locator} could not be resolved in the {document} document")]
    Resolution {
        document: DocumentRef,
        locator: Locator,
    },

    #[error("Input action {action} could not be delivered: {reason}")]
    Dispatch { action: String, reason: String },

    #[error("Focus query failed: {0}")]
    Query(String),

    #[error("Log stream subscription failed: {0}")]
    Subscription(String),

    #[error("Setup step {step} ({action}) left the page in an unexpected state: {detail}")]
    Precondition {
        step: usize,
        action: String,
        detail: String,
    },

    #[error("{stage} did not finish within the {deadline_ms}ms scenario deadline")]
    Timeout { stage: String, deadline_ms: u64 },

    #[error("Invalid engine script: {0}")]
    Script(String),

    #[error("No expectation recorded for {engine} / {scenario}")]
    MissingExpectation { engine: String, scenario: String },
}

pub type HarnessResult<T> = Result<T, HarnessError>;

/// Raised when a string does not name a known engine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown engine: {0}. Must be one of: chromium, firefox, webkit")]
pub struct UnknownEngine(pub String);

/// Raised when a string does not name a known scenario.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown scenario: {0}")]
pub struct UnknownScenario(pub String);
