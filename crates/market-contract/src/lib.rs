// crates/market-contract/src/lib.rs
// ============================================================================
// Module: Market Contract Library
// Description: Scenario model, sequential runner, and reporting for the market API.
// Purpose: Exercise the remote market API with ordered request/expectation pairs.
// Dependencies: reqwest, serde, serde_json, serde_jcs, thiserror, toml, url, rand
// ============================================================================

//! ## Overview
//! `market-contract` drives a remote grocery-marketplace HTTP API through an
//! ordered list of declarative scenarios. A single market is created during
//! setup, its identifier is threaded through every scenario via an explicit
//! [`SuiteContext`], and the market is deleted during teardown.
//! Invariants:
//! - Scenarios run strictly in declared order, one request at a time.
//! - Setup runs exactly once; a failed setup aborts the run without scenarios.
//! - Teardown runs exactly once after every scenario once setup succeeded.
//! - Scenario failures are recorded individually and never stop the run.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod assertions;
pub mod audit;
pub mod catalog;
pub mod client;
pub mod config;
pub mod context;
pub mod identifiers;
pub mod names;
pub mod report;
pub mod runner;
pub mod scenario;


// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use assertions::AssertionFailure;
pub use assertions::check_expectation;
pub use audit::FileRunLog;
pub use audit::MemoryRunLog;
pub use audit::MultiRunLog;
pub use audit::NoopRunLog;
pub use audit::RunEvent;
pub use audit::RunLogSink;
pub use audit::StderrRunLog;
pub use catalog::market_suite;
pub use client::ClientError;
pub use client::HttpExchange;
pub use client::HttpRequest;
pub use client::MarketHttpClient;
pub use client::TranscriptEntry;
pub use client::Transport;
pub use config::ConfigError;
pub use config::ConfigOverrides;
pub use config::ContractConfig;
pub use context::ContextError;
pub use context::SuiteContext;
pub use identifiers::MarketId;
pub use names::fresh_market_name;
pub use report::ReportError;
pub use report::RunArtifacts;
pub use runner::ContractRunner;
pub use runner::RunnerError;
pub use runner::StepKind;
pub use runner::StepOutcome;
pub use runner::StepReport;
pub use runner::SuiteReport;
pub use scenario::BodyExpectation;
pub use scenario::Expectation;
pub use scenario::HttpMethod;
pub use scenario::Scenario;
pub use scenario::ScenarioPath;
pub use scenario::ScenarioSuite;
pub use scenario::SetupStep;
pub use scenario::Template;
