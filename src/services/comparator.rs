//! Comparator - exact structural equality of results against expectations.

use crate::domain::models::{Divergence, Expectation, Mismatch, ScenarioResult};

/// First index where two ordered sequences differ, if any.
///
/// Sequences of different length diverge at the shorter length, with `None`
/// standing in for the missing element. Swapping the arguments yields the
/// same index with the sides flipped.
pub fn first_divergence<T: PartialEq + Clone>(left: &[T], right: &[T]) -> Option<Divergence<T>> {
    let index = left
        .iter()
        .zip(right)
        .position(|(l, r)| l != r)
        .or_else(|| (left.len() != right.len()).then(|| left.len().min(right.len())))?;

    Some(Divergence {
        index,
        left: left.get(index).cloned(),
        right: right.get(index).cloned(),
    })
}

/// Check a scenario result against its expectation.
///
/// A non-converged result only matches a `NonConvergent` expectation, and a
/// converged one only matches an `Exact` expectation. Traces are compared
/// before logs; the first divergence found is reported.
pub fn compare(expectation: &Expectation, result: &ScenarioResult) -> Result<(), Mismatch> {
    let actual = result.outcome.kind();
    let expected = expectation.outcome_kind();
    if expected != actual {
        return Err(Mismatch::Outcome { expected, actual });
    }

    let Expectation::Exact { trace, log } = expectation else {
        return Ok(());
    };

    if let Some(divergence) = first_divergence(trace.as_slice(), result.trace.as_slice()) {
        return Err(Mismatch::Trace {
            index: divergence.index,
            expected: divergence.left,
            actual: divergence.right,
        });
    }

    if let Some(log) = log {
        if let Some(divergence) = first_divergence(log.as_slice(), result.log.as_slice()) {
            return Err(Mismatch::Log {
                index: divergence.index,
                expected: divergence.left,
                actual: divergence.right,
            });
        }
    }

    Ok(())
}
