// crates/market-contract-cli/src/render.rs
// ============================================================================
// Module: CLI Rendering
// Description: Human-readable lines for step results and the scenario catalog.
// Purpose: Keep console formatting out of the command handlers.
// Dependencies: market-contract, serde
// ============================================================================

//! ## Overview
//! Pure formatting helpers. Nothing here writes to a stream; the command
//! handlers decide where lines go.

// ============================================================================
// SECTION: Imports
// ============================================================================

use market_contract::ScenarioSuite;
use market_contract::StepOutcome;
use market_contract::StepReport;
use market_contract::SuiteReport;
use market_contract::report::step_label;
use serde::Serialize;

// ============================================================================
// SECTION: Step Output
// ============================================================================

/// One console line per executed step.
pub(crate) fn step_line(step: &StepReport) -> String {
    let tag = match step.outcome {
        StepOutcome::Passed => "PASS",
        StepOutcome::Failed {
            ..
        } => "FAIL",
        StepOutcome::Error {
            ..
        } => "ERROR",
    };
    let status = step.status.map_or_else(|| "-".to_string(), |status| status.to_string());
    let url = step.url.as_deref().unwrap_or("-");
    let mut line = format!(
        "{tag:<5} {:<8} {} [{} {url} -> {status}] {} ms",
        step_label(step),
        step.name,
        step.method,
        step.duration_ms
    );
    if let Some(detail) = step.outcome.detail() {
        line.push_str(": ");
        line.push_str(&detail);
    }
    line
}

/// Closing line for a completed run.
pub(crate) fn summary_line(report: &SuiteReport) -> String {
    let id = report.market_id.as_ref().map_or_else(|| "-".to_string(), ToString::to_string);
    format!(
        "suite {}: {} passed, {} failed in {} ms (market \"{}\", id {id})",
        report.suite,
        report.passed_count(),
        report.failed_count(),
        report.duration_ms,
        report.market_name
    )
}

// ============================================================================
// SECTION: Catalog Output
// ============================================================================

/// Catalog row for `list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct CatalogEntry {
    /// `setup`, a two-digit scenario number, or `teardown`.
    pub(crate) step: String,
    /// Scenario name.
    pub(crate) name: String,
    /// `METHOD path -> status`.
    pub(crate) request: String,
}

/// Catalog rows in execution order, setup and teardown included.
pub(crate) fn catalog_entries(suite: &ScenarioSuite) -> Vec<CatalogEntry> {
    let mut entries = Vec::with_capacity(suite.scenarios.len() + 2);
    entries.push(CatalogEntry {
        step: "setup".to_string(),
        name: suite.setup.request.name.clone(),
        request: suite.setup.request.describe(),
    });
    entries.extend(suite.numbered().map(|(number, scenario)| CatalogEntry {
        step: format!("{number:02}"),
        name: scenario.name.clone(),
        request: scenario.describe(),
    }));
    entries.push(CatalogEntry {
        step: "teardown".to_string(),
        name: suite.teardown.name.clone(),
        request: suite.teardown.describe(),
    });
    entries
}

/// Plain-text catalog lines.
pub(crate) fn catalog_lines(suite: &ScenarioSuite) -> Vec<String> {
    catalog_entries(suite)
        .into_iter()
        .map(|entry| format!("{:<8} {:<55} {}", entry.step, entry.request, entry.name))
        .collect()
}
