// crates/market-contract/src/runner.rs
// ============================================================================
// Module: Sequential Contract Runner
// Description: Fixture lifecycle and ordered scenario execution.
// Purpose: Run setup, scenarios, and teardown with attributed outcomes.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! [`ContractRunner`] executes a [`ScenarioSuite`] against a [`Transport`].
//! Setup creates the fixture market and captures its id in the
//! [`SuiteContext`]; scenarios run one at a time in declared order; teardown
//! deletes the fixture.
//! Invariants:
//! - Each request is sent only after the previous response was fully read.
//! - A failed setup returns [`RunnerError::Setup`]; no scenario and no
//!   teardown request is sent.
//! - After a successful setup, teardown runs exactly once, whatever the
//!   scenario outcomes were. Scenario failures never short-circuit the loop.
//! - Nothing is retried.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Instant;

use serde::Serialize;
use thiserror::Error;

use crate::assertions::AssertionFailure;
use crate::assertions::check_expectation;
use crate::audit::RunEvent;
use crate::audit::RunLogSink;
use crate::audit::duration_millis;
use crate::audit::now_millis;
use crate::client::HttpExchange;
use crate::client::HttpRequest;
use crate::client::Transport;
use crate::context::SuiteContext;
use crate::identifiers::MarketId;
use crate::scenario::HttpMethod;
use crate::scenario::Scenario;
use crate::scenario::ScenarioSuite;

// ============================================================================
// SECTION: Report Types
// ============================================================================

/// Lifecycle phase of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Fixture creation.
    Setup,
    /// Ordered scenario.
    Scenario,
    /// Fixture deletion.
    Teardown,
}

/// Result of a single step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepOutcome {
    /// Every expectation held.
    Passed,
    /// A response arrived but at least one expectation failed.
    Failed {
        /// Unmet expectations.
        failures: Vec<AssertionFailure>,
    },
    /// No usable response: transport failure, timeout, or unresolved path.
    Error {
        /// Error description.
        message: String,
    },
}

impl StepOutcome {
    /// Stable outcome label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed {
                ..
            } => "failed",
            Self::Error {
                ..
            } => "error",
        }
    }

    /// Returns true for [`StepOutcome::Passed`].
    #[must_use]
    pub const fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }

    /// Human-readable failure detail, `None` when passed.
    #[must_use]
    pub fn detail(&self) -> Option<String> {
        match self {
            Self::Passed => None,
            Self::Failed {
                failures,
            } => Some(failures.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")),
            Self::Error {
                message,
            } => Some(message.clone()),
        }
    }
}

/// Report for one executed step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    /// Lifecycle phase.
    pub kind: StepKind,
    /// 1-based scenario number; `None` for setup and teardown.
    pub number: Option<usize>,
    /// Step name.
    pub name: String,
    /// HTTP method.
    pub method: HttpMethod,
    /// Resolved URL, when resolution succeeded.
    pub url: Option<String>,
    /// Response status, when a response arrived.
    pub status: Option<u16>,
    /// Step outcome.
    #[serde(flatten)]
    pub outcome: StepOutcome,
    /// Wall-clock duration.
    pub duration_ms: u64,
}

/// Report for a full suite run that got past setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuiteReport {
    /// Suite name.
    pub suite: String,
    /// Base URL the suite ran against.
    pub base_url: String,
    /// Fixture market name.
    pub market_name: String,
    /// Fixture market id.
    pub market_id: Option<MarketId>,
    /// Setup step.
    pub setup: StepReport,
    /// Scenario steps in execution order.
    pub scenarios: Vec<StepReport>,
    /// Teardown step.
    pub teardown: StepReport,
    /// Run start (milliseconds since epoch).
    pub started_at_ms: u64,
    /// Total duration.
    pub duration_ms: u64,
}

impl SuiteReport {
    /// All steps in execution order.
    pub fn steps(&self) -> impl Iterator<Item = &StepReport> {
        std::iter::once(&self.setup)
            .chain(self.scenarios.iter())
            .chain(std::iter::once(&self.teardown))
    }

    /// Number of passed steps.
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.steps().filter(|step| step.outcome.is_passed()).count()
    }

    /// Number of failed or errored steps.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.steps().filter(|step| !step.outcome.is_passed()).count()
    }

    /// Returns true when every step passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.failed_count() == 0
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Fatal runner errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunnerError {
    /// Setup did not produce a fixture id; the suite was not run.
    #[error("setup failed: {reason}")]
    Setup {
        /// Setup step report.
        report: Box<StepReport>,
        /// Failure description.
        reason: String,
    },
}

// ============================================================================
// SECTION: Runner
// ============================================================================

/// Sequential runner over a transport and a run log.
pub struct ContractRunner<'a> {
    /// Network seam.
    transport: &'a dyn Transport,
    /// Run event sink.
    log: &'a dyn RunLogSink,
}

impl<'a> ContractRunner<'a> {
    /// Creates a runner.
    #[must_use]
    pub fn new(transport: &'a dyn Transport, log: &'a dyn RunLogSink) -> Self {
        Self {
            transport,
            log,
        }
    }

    /// Runs setup, every scenario in order, then teardown.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Setup`] when the fixture could not be created;
    /// in that case no scenario or teardown request is sent.
    pub async fn run_suite(
        &self,
        suite: &ScenarioSuite,
        mut context: SuiteContext,
    ) -> Result<SuiteReport, RunnerError> {
        let started_at_ms = now_millis();
        let started = Instant::now();
        let mut event = RunEvent::new("suite_started", &suite.name);
        event.detail = Some(format!("{} as {}", context.base_url(), context.market_name()));
        self.log.record(&event);

        let setup = match self.setup(suite, &mut context).await {
            Ok(report) => report,
            Err(err) => {
                let mut event = RunEvent::new("suite_aborted", &suite.name);
                event.detail = Some(err.to_string());
                self.log.record(&event);
                return Err(err);
            }
        };

        let mut scenarios = Vec::with_capacity(suite.scenarios.len());
        for (number, scenario) in suite.numbered() {
            scenarios.push(self.run_scenario(&suite.name, number, scenario, &context).await);
        }

        let teardown = self.teardown(suite, &context).await;

        let report = SuiteReport {
            suite: suite.name.clone(),
            base_url: context.base_url().to_string(),
            market_name: context.market_name().to_string(),
            market_id: context.market_id().cloned(),
            setup,
            scenarios,
            teardown,
            started_at_ms,
            duration_ms: duration_millis(started.elapsed()),
        };
        let mut event = RunEvent::new("suite_finished", &suite.name);
        event.outcome = Some(if report.passed() { "passed" } else { "failed" });
        event.detail =
            Some(format!("{} passed, {} failed", report.passed_count(), report.failed_count()));
        self.log.record(&event);
        Ok(report)
    }

    /// Creates the fixture market and captures its id into `context`.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Setup`] when the request fails, an expectation
    /// fails, or the response carries no usable id.
    pub async fn setup(
        &self,
        suite: &ScenarioSuite,
        context: &mut SuiteContext,
    ) -> Result<StepReport, RunnerError> {
        let step = &suite.setup;
        let (mut report, exchange) =
            self.execute(StepKind::Setup, None, &step.request, context).await;
        let captured = match (&report.outcome, exchange) {
            (StepOutcome::Passed, Some(exchange)) => extract_id(&exchange, &step.id_pointer)
                .ok_or_else(|| {
                    format!(
                        "response has no market id at {}; the created market is left on the server",
                        step.id_pointer
                    )
                })
                .and_then(|id| context.capture_market_id(id).map_err(|err| err.to_string())),
            _ => Err(report.outcome.detail().unwrap_or_else(|| "no response".to_string())),
        };
        if let Err(reason) = captured {
            if report.outcome.is_passed() {
                report.outcome = StepOutcome::Error {
                    message: reason.clone(),
                };
            }
            self.log_step(&suite.name, "setup_finished", &report);
            return Err(RunnerError::Setup {
                report: Box::new(report),
                reason,
            });
        }
        self.log_step(&suite.name, "setup_finished", &report);
        Ok(report)
    }

    /// Runs one scenario; failures are reported, never raised.
    pub async fn run_scenario(
        &self,
        suite_name: &str,
        number: usize,
        scenario: &Scenario,
        context: &SuiteContext,
    ) -> StepReport {
        let (report, _) = self.execute(StepKind::Scenario, Some(number), scenario, context).await;
        self.log_step(suite_name, "scenario_finished", &report);
        report
    }

    /// Deletes the fixture market.
    pub async fn teardown(&self, suite: &ScenarioSuite, context: &SuiteContext) -> StepReport {
        let (report, _) = self.execute(StepKind::Teardown, None, &suite.teardown, context).await;
        self.log_step(&suite.name, "teardown_finished", &report);
        report
    }

    /// Resolves, sends, and checks one scenario.
    async fn execute(
        &self,
        kind: StepKind,
        number: Option<usize>,
        scenario: &Scenario,
        context: &SuiteContext,
    ) -> (StepReport, Option<HttpExchange>) {
        let started = Instant::now();
        let mut report = StepReport {
            kind,
            number,
            name: scenario.name.clone(),
            method: scenario.method,
            url: None,
            status: None,
            outcome: StepOutcome::Passed,
            duration_ms: 0,
        };
        let url = match context.resolve_url(&scenario.path) {
            Ok(url) => url,
            Err(err) => {
                report.outcome = StepOutcome::Error {
                    message: err.to_string(),
                };
                report.duration_ms = duration_millis(started.elapsed());
                return (report, None);
            }
        };
        report.url = Some(url.clone());
        let request = HttpRequest {
            method: scenario.method,
            url,
            body: scenario.body.as_ref().map(|body| context.render_body(body)),
        };
        let exchange = match self.transport.send(&request).await {
            Ok(exchange) => exchange,
            Err(err) => {
                report.outcome = StepOutcome::Error {
                    message: err.to_string(),
                };
                report.duration_ms = duration_millis(started.elapsed());
                return (report, None);
            }
        };
        report.status = Some(exchange.status.as_u16());
        let failures = check_expectation(&scenario.expect, context, &exchange);
        if !failures.is_empty() {
            report.outcome = StepOutcome::Failed {
                failures,
            };
        }
        report.duration_ms = duration_millis(started.elapsed());
        (report, Some(exchange))
    }

    /// Emits a step event.
    fn log_step(&self, suite_name: &str, event: &'static str, report: &StepReport) {
        let mut record = RunEvent::new(event, suite_name);
        record.step = report.number;
        record.name = Some(report.name.clone());
        record.outcome = Some(report.outcome.label());
        record.status = report.status;
        record.detail = report.outcome.detail();
        self.log.record(&record);
    }
}

/// Reads the fixture id from a creation response.
fn extract_id(exchange: &HttpExchange, pointer: &str) -> Option<MarketId> {
    exchange.json.as_ref().and_then(|json| json.pointer(pointer)).and_then(MarketId::from_json)
}
