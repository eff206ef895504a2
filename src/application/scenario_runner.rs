//! Scenario runner - executes scenario plans on one engine and judges them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, error, info, instrument, warn};

use crate::domain::errors::{HarnessError, HarnessResult};
use crate::domain::models::{
    Config, ConvergenceConfig, EventLog, Mismatch, RunContext, ScenarioId, ScenarioPlan,
    ScenarioResult, Trace,
};
use crate::domain::ports::{InputDriver, SessionFactory};
use crate::services::{
    compare, ConvergenceLoop, EventLogCollector, ExpectationMatrix, SnapshotSampler,
};

/// Final judgement on one scenario.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "verdict", rename_all = "kebab-case")]
pub enum Verdict {
    /// Result matched the expectation for this engine
    Passed,

    /// Result diverged from the expectation
    Failed { mismatch: Mismatch },

    /// The scenario could not be run to an outcome; what was collected
    /// before the failure is kept for diagnosis
    Aborted {
        error: String,
        trace: Trace,
        log: EventLog,
    },
}

impl Verdict {
    pub const fn is_pass(&self) -> bool {
        matches!(self, Self::Passed)
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed { .. } => "failed",
            Self::Aborted { .. } => "aborted",
        }
    }
}

/// Everything known about one scenario run.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub scenario: ScenarioId,
    pub context: RunContext,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,

    /// Present when the scenario ran to an outcome
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ScenarioResult>,

    /// Snapshots outside the single-focus model, by trace index
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub anomalies: Vec<String>,

    #[serde(flatten)]
    pub verdict: Verdict,
}

/// Reports for a batch of scenarios on one engine.
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub context: RunContext,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub scenarios: Vec<ScenarioReport>,
}

impl SuiteReport {
    pub fn passed(&self) -> usize {
        self.count(|verdict| matches!(verdict, Verdict::Passed))
    }

    pub fn failed(&self) -> usize {
        self.count(|verdict| matches!(verdict, Verdict::Failed { .. }))
    }

    pub fn aborted(&self) -> usize {
        self.count(|verdict| matches!(verdict, Verdict::Aborted { .. }))
    }

    pub fn all_passed(&self) -> bool {
        self.scenarios.iter().all(|report| report.verdict.is_pass())
    }

    fn count(&self, predicate: impl Fn(&Verdict) -> bool) -> usize {
        self.scenarios
            .iter()
            .filter(|report| predicate(&report.verdict))
            .count()
    }
}

enum Execution {
    Completed(ScenarioResult),
    Aborted {
        error: HarnessError,
        trace: Trace,
        log: EventLog,
    },
}

/// Runs scenarios against pages from one [`SessionFactory`].
///
/// Every scenario gets a fresh page, its own log collector and its own
/// convergence loop; nothing carries over between scenarios.
pub struct ScenarioRunner {
    factory: Arc<dyn SessionFactory>,
    matrix: &'static ExpectationMatrix,
    convergence: ConvergenceConfig,
    log_drain_timeout: Duration,
}

impl ScenarioRunner {
    pub fn new(factory: Arc<dyn SessionFactory>, config: &Config) -> Self {
        Self {
            factory,
            matrix: ExpectationMatrix::builtin(),
            convergence: config.convergence,
            log_drain_timeout: config.log_drain_timeout(),
        }
    }

    pub fn context(&self) -> RunContext {
        RunContext {
            engine: self.factory.engine(),
            headless: self.factory.headless(),
        }
    }

    /// Run each plan in order and collect the reports.
    pub async fn run_all(&self, plans: &[ScenarioPlan]) -> SuiteReport {
        let started_at = Utc::now();
        let clock = Instant::now();

        let mut scenarios = Vec::with_capacity(plans.len());
        for plan in plans {
            scenarios.push(self.run(plan).await);
        }

        let suite = SuiteReport {
            context: self.context(),
            started_at,
            duration_ms: elapsed_ms(clock),
            scenarios,
        };
        info!(
            context = %suite.context,
            passed = suite.passed(),
            failed = suite.failed(),
            aborted = suite.aborted(),
            "Suite finished"
        );
        suite
    }

    /// Run one scenario and judge the result. Never fails; faults become an
    /// `Aborted` verdict.
    #[instrument(skip(self, plan), fields(scenario = %plan.id, context = %self.context()))]
    pub async fn run(&self, plan: &ScenarioPlan) -> ScenarioReport {
        let started_at = Utc::now();
        let clock = Instant::now();
        let context = self.context();

        let (result, verdict) = match self.execute(plan).await {
            Execution::Completed(result) => {
                let verdict = self.judge(context, plan.id, &result);
                (Some(result), verdict)
            }
            Execution::Aborted { error, trace, log } => {
                error!(%error, snapshots = trace.len(), "Scenario aborted");
                (
                    None,
                    Verdict::Aborted {
                        error: error.to_string(),
                        trace,
                        log,
                    },
                )
            }
        };

        let anomalies = result
            .iter()
            .flat_map(|result| result.trace.iter().enumerate())
            .flat_map(|(index, snapshot)| {
                snapshot
                    .anomalies()
                    .into_iter()
                    .map(move |anomaly| format!("snapshot {index}: {anomaly}"))
            })
            .collect();

        ScenarioReport {
            scenario: plan.id,
            context,
            started_at,
            duration_ms: elapsed_ms(clock),
            result,
            anomalies,
            verdict,
        }
    }

    fn judge(&self, context: RunContext, scenario: ScenarioId, result: &ScenarioResult) -> Verdict {
        let Some(expectation) = self.matrix.lookup(context, scenario) else {
            let error = HarnessError::MissingExpectation {
                engine: context.to_string(),
                scenario: scenario.to_string(),
            };
            error!(%error, "Scenario has no expectation");
            return Verdict::Aborted {
                error: error.to_string(),
                trace: result.trace.clone(),
                log: result.log.clone(),
            };
        };

        match compare(expectation, result) {
            Ok(()) => {
                info!(outcome = ?result.outcome.kind(), "Scenario passed");
                Verdict::Passed
            }
            Err(mismatch) => {
                warn!(%mismatch, "Scenario failed");
                Verdict::Failed { mismatch }
            }
        }
    }

    async fn execute(&self, plan: &ScenarioPlan) -> Execution {
        // One clock for setup and the traced part alike.
        let deadline = Instant::now() + self.convergence.deadline();

        let opened = match timeout_at(deadline, self.factory.open(plan.fixture)).await {
            Ok(opened) => opened,
            Err(_) => Err(self.timed_out("opening the page")),
        };
        let session = match opened {
            Ok(session) => session,
            Err(error) => {
                return Execution::Aborted {
                    error,
                    trace: Trace::default(),
                    log: EventLog::default(),
                }
            }
        };

        // Subscribe before the first input so no line is missed.
        let collector =
            match EventLogCollector::start(Arc::clone(&session.logs), self.log_drain_timeout).await
            {
                Ok(collector) => collector,
                Err(error) => {
                    return Execution::Aborted {
                        error,
                        trace: Trace::default(),
                        log: EventLog::default(),
                    }
                }
            };

        let sampler = SnapshotSampler::new(Arc::clone(&session.query), plan.layout.clone());
        let looped = ConvergenceLoop::new(self.convergence);

        let driver = session.driver.as_ref();
        let traced = match self.run_setup(plan, &sampler, driver, deadline).await {
            Ok(()) => {
                looped
                    .run_until(&sampler, driver, &plan.phases, deadline)
                    .await
            }
            Err(error) => Err(error),
        };

        let (log, log_error) = match collector.finish().await {
            Ok(log) => (log, None),
            Err(error) => (EventLog::default(), Some(error)),
        };

        match (traced, log_error) {
            (Ok(report), None) => Execution::Completed(ScenarioResult {
                outcome: report.outcome,
                trace: report.trace,
                log,
                actions_issued: report.actions_issued,
            }),
            (Ok(report), Some(error)) => Execution::Aborted {
                error,
                trace: report.trace,
                log,
            },
            (Err(error), _) => Execution::Aborted {
                error,
                trace: looped.get_state().await.trace,
                log,
            },
        }
    }

    /// Bring the page into the scenario's starting state.
    async fn run_setup(
        &self,
        plan: &ScenarioPlan,
        sampler: &SnapshotSampler,
        driver: &dyn InputDriver,
        deadline: Instant,
    ) -> HarnessResult<()> {
        for (step, setup) in plan.setup.iter().enumerate() {
            match timeout_at(deadline, driver.issue(&setup.action)).await {
                Ok(issued) => issued?,
                Err(_) => {
                    return Err(HarnessError::Dispatch {
                        action: setup.action.to_string(),
                        reason: format!(
                            "not delivered within {}ms",
                            self.convergence.deadline_ms
                        ),
                    })
                }
            }

            let Some(checkpoint) = &setup.checkpoint else {
                continue;
            };
            let snapshot = match timeout_at(deadline, sampler.sample()).await {
                Ok(snapshot) => snapshot?,
                Err(_) => return Err(self.timed_out(&format!("setup step {step} checkpoint"))),
            };
            let violations = checkpoint.violations(&snapshot);
            if !violations.is_empty() {
                return Err(HarnessError::Precondition {
                    step,
                    action: setup.action.to_string(),
                    detail: violations.join("; "),
                });
            }
            debug!(step, %snapshot, "Setup checkpoint satisfied");
        }
        Ok(())
    }

    fn timed_out(&self, stage: &str) -> HarnessError {
        HarnessError::Timeout {
            stage: stage.to_string(),
            deadline_ms: self.convergence.deadline_ms,
        }
    }
}

fn elapsed_ms(since: Instant) -> u64 {
    u64::try_from(since.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::scripted::{profiles, EngineScript, ScriptedSessionFactory};
    use crate::domain::models::{
        DocumentRef, ElementRef, Engine, Fixture, Locator, OutcomeKind, ScenarioOutcome,
    };
    use crate::domain::ports::{FocusQuery, PageSession};
    use crate::services::scenario_catalog;
    use async_trait::async_trait;

    fn runner(context: RunContext) -> (Arc<ScriptedSessionFactory>, ScenarioRunner) {
        let factory = Arc::new(ScriptedSessionFactory::new(context));
        let runner = ScenarioRunner::new(factory.clone(), &Config::default());
        (factory, runner)
    }

    #[tokio::test]
    async fn test_chromium_tabbing_in_iframe_passes() {
        let (_, runner) = runner(RunContext::headless(Engine::Chromium));
        let report = runner
            .run(&scenario_catalog::plan(ScenarioId::TabbingInIframe))
            .await;

        assert!(report.verdict.is_pass(), "{:?}", report.verdict);
        let result = report.result.unwrap();
        assert_eq!(result.outcome, ScenarioOutcome::Converged);
        assert_eq!(result.trace.len(), 3);
        assert_eq!(result.log.len(), 9);
        assert!(report.anomalies.is_empty());
    }

    #[tokio::test]
    async fn test_webkit_non_convergence_passes_as_expected() {
        let (factory, runner) = runner(RunContext::headed(Engine::Webkit));
        let report = runner
            .run(&scenario_catalog::plan(ScenarioId::ShiftTabbingInIframe))
            .await;

        assert!(report.verdict.is_pass(), "{:?}", report.verdict);
        let result = report.result.unwrap();
        assert_eq!(result.outcome.kind(), OutcomeKind::NonConverged);
        assert_eq!(result.actions_issued, result.trace.len() - 1);

        // Three setup actions were issued before tracing started.
        let pages = factory.opened().await;
        assert_eq!(pages[0].actions_issued(), result.actions_issued + 3);
    }

    #[tokio::test]
    async fn test_deviating_engine_fails_with_first_divergence() {
        let context = RunContext::headless(Engine::Chromium);
        let mut script = profiles::builtin(context, Fixture::NestedFrame);
        // Re-enter at Input B instead of Input A.
        for transition in script.states.get_mut("outside-2").unwrap().on.iter_mut() {
            if transition.to == "frame-input-a" {
                transition.to = "frame-input-b".to_string();
            }
        }
        let factory = Arc::new(ScriptedSessionFactory::new(context).with_scripts(vec![script]));
        let runner = ScenarioRunner::new(factory, &Config::default());

        let report = runner
            .run(&scenario_catalog::plan(ScenarioId::TabbingInIframe))
            .await;
        let Verdict::Failed { mismatch } = report.verdict else {
            panic!("expected a mismatch, got {:?}", report.verdict);
        };
        assert!(matches!(mismatch, Mismatch::Trace { index: 2, .. }));
    }

    /// Single-document script where clicking Input B lands on Input A.
    fn misdirected_click(context: RunContext) -> EngineScript {
        let mut script = profiles::builtin(context, Fixture::SingleDocument);
        for transition in script.states.get_mut("loaded").unwrap().on.iter_mut() {
            if transition.to == "input-b" {
                transition.to = "input-a".to_string();
            }
        }
        script
    }

    /// Focus queries that never answer.
    struct UnresponsiveQuery;

    #[async_trait]
    impl FocusQuery for UnresponsiveQuery {
        async fn resolve(
            &self,
            _document: DocumentRef,
            _locator: &Locator,
        ) -> HarnessResult<Option<ElementRef>> {
            std::future::pending().await
        }

        async fn active_element(&self, _document: DocumentRef) -> HarnessResult<Option<ElementRef>> {
            std::future::pending().await
        }

        async fn focused_count(&self, _document: DocumentRef) -> HarnessResult<u32> {
            std::future::pending().await
        }

        async fn has_focus(&self, _document: DocumentRef) -> HarnessResult<bool> {
            std::future::pending().await
        }
    }

    /// Scripted pages whose focus queries hang on one fixture.
    struct HangsOn {
        inner: ScriptedSessionFactory,
        fixture: Fixture,
    }

    #[async_trait]
    impl SessionFactory for HangsOn {
        fn engine(&self) -> Engine {
            self.inner.engine()
        }

        fn headless(&self) -> bool {
            self.inner.headless()
        }

        async fn open(&self, fixture: Fixture) -> HarnessResult<PageSession> {
            let mut session = self.inner.open(fixture).await?;
            if fixture == self.fixture {
                session.query = Arc::new(UnresponsiveQuery);
            }
            Ok(session)
        }
    }

    fn hanging_runner(context: RunContext, deadline_ms: u64) -> ScenarioRunner {
        let factory = Arc::new(HangsOn {
            inner: ScriptedSessionFactory::new(context),
            fixture: Fixture::SingleDocument,
        });
        let mut config = Config::default();
        config.convergence.deadline_ms = deadline_ms;
        ScenarioRunner::new(factory, &config)
    }

    #[tokio::test]
    async fn test_failed_setup_checkpoint_aborts() {
        let context = RunContext::headless(Engine::Firefox);
        let script = misdirected_click(context);
        let factory = Arc::new(ScriptedSessionFactory::new(context).with_scripts(vec![script]));
        let runner = ScenarioRunner::new(factory, &Config::default());

        let report = runner.run(&scenario_catalog::plan(ScenarioId::Tabbing)).await;
        assert!(report.result.is_none());
        let Verdict::Aborted { error, trace, log } = report.verdict else {
            panic!("expected an abort");
        };
        assert!(error.contains("Setup step 0"), "{error}");
        assert!(trace.is_empty());
        assert_eq!(log.as_slice(), ["Input B focus".to_string()]);
    }

    #[tokio::test]
    async fn test_run_all_is_independent_per_scenario() {
        let (factory, runner) = runner(RunContext::headless(Engine::Firefox));
        let suite = runner.run_all(&scenario_catalog::all_plans()).await;

        assert_eq!(suite.scenarios.len(), ScenarioId::ALL.len());
        assert!(suite.all_passed(), "{suite:#?}");
        assert_eq!(suite.passed(), ScenarioId::ALL.len());
        assert_eq!(factory.opened().await.len(), ScenarioId::ALL.len());
    }

    #[tokio::test]
    async fn test_hung_setup_checkpoint_is_bounded_by_the_deadline() {
        let runner = hanging_runner(RunContext::headless(Engine::Chromium), 100);

        let report = tokio::time::timeout(
            std::time::Duration::from_secs(3),
            runner.run(&scenario_catalog::plan(ScenarioId::Tabbing)),
        )
        .await
        .expect("scenario must end on its own deadline");

        let Verdict::Aborted { error, trace, .. } = report.verdict else {
            panic!("expected an abort, got {:?}", report.verdict);
        };
        assert!(error.contains("setup step 0 checkpoint"), "{error}");
        assert!(error.contains("100ms"), "{error}");
        assert!(trace.is_empty());
    }

    #[tokio::test]
    async fn test_run_all_continues_after_aborted_scenarios() {
        let context = RunContext::headless(Engine::Firefox);
        let factory = Arc::new(
            ScriptedSessionFactory::new(context).with_scripts(vec![misdirected_click(context)]),
        );
        let runner = ScenarioRunner::new(factory, &Config::default());

        let suite = runner.run_all(&scenario_catalog::all_plans()).await;

        assert_eq!(suite.scenarios.len(), ScenarioId::ALL.len());
        assert_eq!(suite.aborted(), 2);
        assert_eq!(suite.passed(), 3);
        for report in &suite.scenarios {
            let single_document = matches!(
                report.scenario,
                ScenarioId::Tabbing | ScenarioId::ShiftTabbing
            );
            assert_eq!(report.verdict.is_pass(), !single_document, "{report:?}");
        }
    }

    #[tokio::test]
    async fn test_run_all_survives_a_hung_page() {
        let runner = hanging_runner(RunContext::headless(Engine::Chromium), 300);

        let suite = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            runner.run_all(&scenario_catalog::all_plans()),
        )
        .await
        .expect("suite must not hang on one page");

        assert_eq!(suite.aborted(), 2);
        assert_eq!(suite.passed(), 3);
    }
}
