//! Service layer: the convergence engine and its collaborators.

pub mod comparator;
pub mod convergence_loop;
pub mod event_log_collector;
pub mod expectation_matrix;
pub mod scenario_catalog;
pub mod snapshot_sampler;

pub use comparator::{compare, first_divergence};
pub use convergence_loop::{ConvergenceLoop, LoopReport, LoopState};
pub use event_log_collector::EventLogCollector;
pub use expectation_matrix::ExpectationMatrix;
pub use snapshot_sampler::SnapshotSampler;
