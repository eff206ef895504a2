//! ConvergenceLoop - bounded input/sample iteration with stability detection
//!
//! Drives the input driver and the snapshot sampler in lockstep:
//! - One seed snapshot, then exactly one snapshot per issued action
//! - Converge phases repeat an action until a stability predicate holds
//! - Every phase is bounded by an iteration ceiling and a shared wall-clock
//!   deadline; exhausting either is a `NonConverged` outcome, not an error
//!
//! The deadline is only checked before an action is issued. A delivered action
//! is always followed by its snapshot, which may run past the deadline by at
//! most the sample grace; failing that aborts the run.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

use super::snapshot_sampler::SnapshotSampler;
use crate::domain::errors::{HarnessError, HarnessResult};
use crate::domain::models::{
    ConvergenceConfig, InputAction, NonConvergenceReason, Phase, ScenarioOutcome,
    StabilityPredicate, Trace,
};
use crate::domain::ports::InputDriver;

/// Loop progress, readable after the loop ends or aborts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoopState {
    /// Snapshots so far; empty only until the seed is taken
    pub trace: Trace,

    /// Actions handed to the driver
    pub actions_issued: usize,
}

/// Result of a loop that ran to an outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopReport {
    pub outcome: ScenarioOutcome,
    pub trace: Trace,
    pub actions_issued: usize,
}

/// Orchestrates one traced run over a sequence of phases.
///
/// Construct one per scenario; the state is not reset between runs.
///
/// # Examples
///
/// ```no_run
/// use focus_harness::domain::models::{ConvergenceConfig, InputAction, StabilityPredicate};
/// use focus_harness::services::{ConvergenceLoop, SnapshotSampler};
/// # async fn demo(
/// #     sampler: SnapshotSampler,
/// #     driver: &dyn focus_harness::domain::ports::InputDriver,
/// # ) -> focus_harness::domain::HarnessResult<()> {
/// let report = ConvergenceLoop::new(ConvergenceConfig::default())
///     .converge(&sampler, driver, InputAction::TabForward, StabilityPredicate::DocumentsFocused)
///     .await?;
/// assert_eq!(report.actions_issued, report.trace.len() - 1);
/// # Ok(())
/// # }
/// ```
pub struct ConvergenceLoop {
    config: ConvergenceConfig,
    state: Arc<RwLock<LoopState>>,
}

impl ConvergenceLoop {
    pub fn new(config: ConvergenceConfig) -> Self {
        Self {
            config,
            state: Arc::new(RwLock::new(LoopState::default())),
        }
    }

    /// Repeat a single action until `until` holds.
    pub async fn converge(
        &self,
        sampler: &SnapshotSampler,
        driver: &dyn InputDriver,
        action: InputAction,
        until: StabilityPredicate,
    ) -> HarnessResult<LoopReport> {
        self.run(sampler, driver, &[Phase::Converge { action, until }])
            .await
    }

    /// Run the phases against a deadline starting now.
    pub async fn run(
        &self,
        sampler: &SnapshotSampler,
        driver: &dyn InputDriver,
        phases: &[Phase],
    ) -> HarnessResult<LoopReport> {
        let deadline = Instant::now() + self.config.deadline();
        self.run_until(sampler, driver, phases, deadline).await
    }

    /// Seed the trace, then execute each phase in order before `deadline`.
    ///
    /// A phase that exhausts the bound ends the run as `NonConverged`; later
    /// phases are skipped. Resolution and dispatch failures abort with an
    /// error, and the partial trace remains available via [`Self::get_state`].
    pub async fn run_until(
        &self,
        sampler: &SnapshotSampler,
        driver: &dyn InputDriver,
        phases: &[Phase],
        deadline: Instant,
    ) -> HarnessResult<LoopReport> {
        let started = deadline
            .checked_sub(self.config.deadline())
            .unwrap_or_else(Instant::now);

        let seed = match timeout_at(deadline, sampler.sample()).await {
            Ok(snapshot) => snapshot?,
            Err(_) => {
                return Err(HarnessError::Query(format!(
                    "seed snapshot not available within {}ms",
                    self.config.deadline_ms
                )))
            }
        };
        self.state.write().await.trace = Trace::seeded(seed);
        debug!(%seed, "Seed snapshot taken");

        for (index, phase) in phases.iter().enumerate() {
            let stalled = match phase {
                Phase::Step { action } => {
                    self.advance(sampler, driver, action, started, deadline)
                        .await?
                }
                Phase::Converge { action, until } => {
                    self.converge_phase(sampler, driver, action, *until, started, deadline)
                        .await?
                }
            };

            if let Some(reason) = stalled {
                warn!(phase = index, %reason, "Loop did not converge");
                return Ok(self
                    .report(ScenarioOutcome::NonConverged { reason })
                    .await);
            }
        }

        let report = self.report(ScenarioOutcome::Converged).await;
        info!(
            snapshots = report.trace.len(),
            actions = report.actions_issued,
            "Loop converged"
        );
        Ok(report)
    }

    async fn converge_phase(
        &self,
        sampler: &SnapshotSampler,
        driver: &dyn InputDriver,
        action: &InputAction,
        until: StabilityPredicate,
        started: Instant,
        deadline: Instant,
    ) -> HarnessResult<Option<NonConvergenceReason>> {
        let mut iterations = 0u32;

        while !self.latest_holds(until).await {
            // Safety limit
            if iterations >= self.config.max_iterations {
                return Ok(Some(NonConvergenceReason::IterationLimit {
                    limit: self.config.max_iterations,
                }));
            }

            debug!(iteration = iterations, %action, %until, "Predicate not yet satisfied");
            if let Some(reason) = self
                .advance(sampler, driver, action, started, deadline)
                .await?
            {
                return Ok(Some(reason));
            }
            iterations += 1;
        }

        Ok(None)
    }

    /// Issue one action and append one snapshot.
    async fn advance(
        &self,
        sampler: &SnapshotSampler,
        driver: &dyn InputDriver,
        action: &InputAction,
        started: Instant,
        deadline: Instant,
    ) -> HarnessResult<Option<NonConvergenceReason>> {
        if Instant::now() >= deadline {
            return Ok(Some(deadline_reason(started)));
        }
        let Ok(issued) = timeout_at(deadline, driver.issue(action)).await else {
            return Ok(Some(deadline_reason(started)));
        };
        issued?;
        self.state.write().await.actions_issued += 1;

        let grace_ends = deadline.max(Instant::now()) + self.config.sample_grace();
        let snapshot = match timeout_at(grace_ends, sampler.sample()).await {
            Ok(snapshot) => snapshot?,
            Err(_) => {
                return Err(HarnessError::Query(format!(
                    "snapshot after {action} not available within the {}ms sample grace",
                    self.config.sample_grace_ms
                )))
            }
        };
        self.state.write().await.trace.push(snapshot);

        Ok(None)
    }

    async fn latest_holds(&self, predicate: StabilityPredicate) -> bool {
        self.state
            .read()
            .await
            .trace
            .last()
            .is_some_and(|snapshot| predicate.holds(snapshot))
    }

    async fn report(&self, outcome: ScenarioOutcome) -> LoopReport {
        let state = self.state.read().await;
        LoopReport {
            outcome,
            trace: state.trace.clone(),
            actions_issued: state.actions_issued,
        }
    }

    /// Get current loop state (read-only)
    pub async fn get_state(&self) -> LoopState {
        self.state.read().await.clone()
    }
}

fn deadline_reason(started: Instant) -> NonConvergenceReason {
    NonConvergenceReason::Deadline {
        elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::scripted::ScriptedBrowser;
    use crate::domain::models::{
        DocumentRef, ElementRef, Engine, Fixture, FixtureLayout, FocusSnapshot, Locator,
        RunContext, TrackedInput,
    };
    use crate::domain::ports::FocusQuery;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    async fn frame_with_focus_on(
        engine: Engine,
        input: TrackedInput,
    ) -> (Arc<ScriptedBrowser>, SnapshotSampler) {
        let browser = Arc::new(
            ScriptedBrowser::builtin(RunContext::headless(engine), Fixture::NestedFrame).unwrap(),
        );
        let layout = FixtureLayout::by_placeholder(Fixture::NestedFrame);
        browser
            .issue(&InputAction::click(layout.target(input).unwrap()))
            .await
            .unwrap();
        let sampler = SnapshotSampler::new(browser.clone(), layout);
        (browser, sampler)
    }

    #[tokio::test]
    async fn test_predicate_already_true_issues_nothing() {
        let (browser, sampler) = frame_with_focus_on(Engine::Chromium, TrackedInput::B).await;
        let report = ConvergenceLoop::new(ConvergenceConfig::default())
            .converge(
                &sampler,
                browser.as_ref(),
                InputAction::TabForward,
                StabilityPredicate::DocumentsFocused,
            )
            .await
            .unwrap();

        assert_eq!(report.outcome, ScenarioOutcome::Converged);
        assert_eq!(report.trace.len(), 1);
        assert_eq!(report.actions_issued, 0);
    }

    #[tokio::test]
    async fn test_converges_after_leaving_and_reentering() {
        let (browser, sampler) = frame_with_focus_on(Engine::Chromium, TrackedInput::C).await;
        let phases = [
            Phase::Step {
                action: InputAction::TabForward,
            },
            Phase::Converge {
                action: InputAction::TabForward,
                until: StabilityPredicate::DocumentsFocused,
            },
        ];

        let report = ConvergenceLoop::new(ConvergenceConfig::default())
            .run(&sampler, browser.as_ref(), &phases)
            .await
            .unwrap();

        assert_eq!(report.outcome, ScenarioOutcome::Converged);
        assert_eq!(report.trace.len(), 4);
        assert_eq!(report.actions_issued, report.trace.len() - 1);
        assert!(report.trace.last().unwrap().input_a_is_focused);
    }

    #[tokio::test]
    async fn test_iteration_limit_yields_partial_trace() {
        let (browser, sampler) = frame_with_focus_on(Engine::Webkit, TrackedInput::C).await;
        browser.issue(&InputAction::TabForward).await.unwrap();

        let config = ConvergenceConfig {
            max_iterations: 4,
            deadline_ms: 5_000,
            ..ConvergenceConfig::default()
        };
        let report = ConvergenceLoop::new(config)
            .converge(
                &sampler,
                browser.as_ref(),
                InputAction::TabForward,
                StabilityPredicate::DocumentsFocused,
            )
            .await
            .unwrap();

        assert_eq!(
            report.outcome,
            ScenarioOutcome::NonConverged {
                reason: NonConvergenceReason::IterationLimit { limit: 4 }
            }
        );
        assert_eq!(report.trace.len(), 5);
        assert_eq!(report.actions_issued, 4);
        assert!(report.trace.iter().all(|s| *s == FocusSnapshot::BLURRED));
    }

    /// Driver that never completes an action.
    struct HungDriver;

    #[async_trait]
    impl InputDriver for HungDriver {
        async fn issue(&self, _action: &InputAction) -> HarnessResult<()> {
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_deadline_bounds_a_hung_driver() {
        let (_browser, sampler) = frame_with_focus_on(Engine::Chromium, TrackedInput::C).await;
        let config = ConvergenceConfig {
            max_iterations: 100,
            deadline_ms: 50,
            ..ConvergenceConfig::default()
        };

        let report = tokio::time::timeout(
            Duration::from_secs(2),
            ConvergenceLoop::new(config).converge(
                &sampler,
                &HungDriver,
                InputAction::TabForward,
                StabilityPredicate::DocumentUnfocused,
            ),
        )
        .await
        .expect("loop must terminate on its own")
        .unwrap();

        assert!(matches!(
            report.outcome,
            ScenarioOutcome::NonConverged {
                reason: NonConvergenceReason::Deadline { .. }
            }
        ));
        assert_eq!(report.trace.len(), 1);
        assert_eq!(report.actions_issued, 0);
    }

    #[tokio::test]
    async fn test_stale_click_target_aborts_with_partial_state() {
        let (browser, sampler) = frame_with_focus_on(Engine::Chromium, TrackedInput::C).await;
        let stale = InputAction::click(crate::domain::models::ElementTarget {
            document: crate::domain::models::DocumentRef::Nested,
            locator: crate::domain::models::Locator::placeholder("Removed input"),
        });

        let looped = ConvergenceLoop::new(ConvergenceConfig::default());
        let err = looped
            .converge(
                &sampler,
                browser.as_ref(),
                stale,
                StabilityPredicate::DocumentUnfocused,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, HarnessError::Dispatch { .. }));
        let state = looped.get_state().await;
        assert_eq!(state.trace.len(), 1);
        assert_eq!(state.actions_issued, 0);
    }

    /// Page whose focus queries slow down once the first action has landed.
    ///
    /// `stall: None` never answers again.
    struct StallsAfterInput {
        browser: Arc<ScriptedBrowser>,
        stall: Option<Duration>,
        issued: AtomicBool,
    }

    impl StallsAfterInput {
        fn new(browser: Arc<ScriptedBrowser>, stall: Option<Duration>) -> Arc<Self> {
            Arc::new(Self {
                browser,
                stall,
                issued: AtomicBool::new(false),
            })
        }

        async fn stall(&self) {
            if !self.issued.load(Ordering::SeqCst) {
                return;
            }
            match self.stall {
                Some(delay) => tokio::time::sleep(delay).await,
                None => std::future::pending::<()>().await,
            }
        }
    }

    #[async_trait]
    impl InputDriver for StallsAfterInput {
        async fn issue(&self, action: &InputAction) -> HarnessResult<()> {
            self.browser.issue(action).await?;
            self.issued.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    #[async_trait]
    impl FocusQuery for StallsAfterInput {
        async fn resolve(
            &self,
            document: DocumentRef,
            locator: &Locator,
        ) -> HarnessResult<Option<ElementRef>> {
            self.stall().await;
            self.browser.resolve(document, locator).await
        }

        async fn active_element(&self, document: DocumentRef) -> HarnessResult<Option<ElementRef>> {
            self.stall().await;
            self.browser.active_element(document).await
        }

        async fn focused_count(&self, document: DocumentRef) -> HarnessResult<u32> {
            self.stall().await;
            self.browser.focused_count(document).await
        }

        async fn has_focus(&self, document: DocumentRef) -> HarnessResult<bool> {
            self.stall().await;
            self.browser.has_focus(document).await
        }
    }

    #[tokio::test]
    async fn test_hung_sample_after_delivered_action_aborts() {
        let (browser, _) = frame_with_focus_on(Engine::Webkit, TrackedInput::C).await;
        let page = StallsAfterInput::new(browser, None);
        let sampler = SnapshotSampler::new(
            page.clone(),
            FixtureLayout::by_placeholder(Fixture::NestedFrame),
        );
        let config = ConvergenceConfig {
            max_iterations: 100,
            deadline_ms: 100,
            sample_grace_ms: 50,
        };

        let looped = ConvergenceLoop::new(config);
        let err = tokio::time::timeout(
            Duration::from_secs(2),
            looped.converge(
                &sampler,
                page.as_ref(),
                InputAction::TabForward,
                StabilityPredicate::DocumentUnfocused,
            ),
        )
        .await
        .expect("loop must terminate on its own")
        .unwrap_err();

        assert!(matches!(err, HarnessError::Query(_)), "{err:?}");
        let state = looped.get_state().await;
        assert_eq!(state.trace.len(), 1);
        assert_eq!(state.actions_issued, 1);
    }

    #[tokio::test]
    async fn test_slow_sample_past_deadline_keeps_actions_in_step() {
        // WebKit stays blurred after leaving the frame, so the predicate never holds.
        let (browser, _) = frame_with_focus_on(Engine::Webkit, TrackedInput::C).await;
        browser.issue(&InputAction::TabForward).await.unwrap();
        let page = StallsAfterInput::new(browser, Some(Duration::from_millis(30)));
        let sampler = SnapshotSampler::new(
            page.clone(),
            FixtureLayout::by_placeholder(Fixture::NestedFrame),
        );
        let config = ConvergenceConfig {
            max_iterations: 100,
            deadline_ms: 20,
            sample_grace_ms: 2_000,
        };

        let report = ConvergenceLoop::new(config)
            .converge(
                &sampler,
                page.as_ref(),
                InputAction::TabForward,
                StabilityPredicate::DocumentsFocused,
            )
            .await
            .unwrap();

        assert!(matches!(
            report.outcome,
            ScenarioOutcome::NonConverged {
                reason: NonConvergenceReason::Deadline { .. }
            }
        ));
        assert_eq!(report.actions_issued, report.trace.len() - 1);
        assert!(report.actions_issued >= 1);
        assert!(report.trace.iter().all(|s| *s == FocusSnapshot::BLURRED));
    }
}
