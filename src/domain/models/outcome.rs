//! Scenario results, expectations and comparison failures.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::snapshot::{EventLog, FocusSnapshot, Trace};

/// Why a converge phase gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NonConvergenceReason {
    IterationLimit { limit: u32 },
    Deadline { elapsed_ms: u64 },
}

impl fmt::Display for NonConvergenceReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IterationLimit { limit } => write!(f, "iteration limit of {limit} reached"),
            Self::Deadline { elapsed_ms } => write!(f, "deadline hit after {elapsed_ms}ms"),
        }
    }
}

/// How a scenario's trace ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum ScenarioOutcome {
    Converged,
    NonConverged { reason: NonConvergenceReason },
}

impl ScenarioOutcome {
    pub const fn kind(&self) -> OutcomeKind {
        match self {
            Self::Converged => OutcomeKind::Converged,
            Self::NonConverged { .. } => OutcomeKind::NonConverged,
        }
    }
}

/// Outcome without its payload, for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutcomeKind {
    Converged,
    NonConverged,
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Converged => f.write_str("converged"),
            Self::NonConverged => f.write_str("non-converged"),
        }
    }
}

/// Everything one scenario run produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioResult {
    #[serde(flatten)]
    pub outcome: ScenarioOutcome,
    pub trace: Trace,
    pub log: EventLog,
    pub actions_issued: usize,
}

/// What an engine is expected to do in a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Expectation {
    /// The loop converges and produces exactly this trace.
    Exact {
        trace: Trace,
        /// `None` when the log is not asserted for this scenario.
        log: Option<EventLog>,
    },
    /// The engine never satisfies the stability predicate.
    NonConvergent,
}

impl Expectation {
    pub const fn outcome_kind(&self) -> OutcomeKind {
        match self {
            Self::Exact { .. } => OutcomeKind::Converged,
            Self::NonConvergent => OutcomeKind::NonConverged,
        }
    }
}

/// First point at which two sequences differ.
///
/// `None` on one side means that sequence ended before `index`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Divergence<T> {
    pub index: usize,
    pub left: Option<T>,
    pub right: Option<T>,
}

impl<T> Divergence<T> {
    /// Same divergence seen from the other side.
    pub fn flipped(self) -> Self {
        Self {
            index: self.index,
            left: self.right,
            right: self.left,
        }
    }
}

/// Structural inequality between a result and its expectation.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mismatch {
    #[error("Outcome mismatch: expected {expected}, got {actual}")]
    Outcome {
        expected: OutcomeKind,
        actual: OutcomeKind,
    },

    #[error(
        "Trace diverges at index {index}: expected {}, got {}",
        describe(.expected.as_ref()),
        describe(.actual.as_ref())
    )]
    Trace {
        index: usize,
        expected: Option<FocusSnapshot>,
        actual: Option<FocusSnapshot>,
    },

    #[error(
        "Event log diverges at index {index}: expected {}, got {}",
        describe(.expected.as_ref()),
        describe(.actual.as_ref())
    )]
    Log {
        index: usize,
        expected: Option<String>,
        actual: Option<String>,
    },
}

fn describe<T: fmt::Display>(value: Option<&T>) -> String {
    value.map_or_else(|| "end of sequence".to_string(), ToString::to_string)
}
