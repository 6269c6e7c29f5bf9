// crates/market-contract/src/report.rs
// ============================================================================
// Module: Run Artifacts
// Description: Summary and transcript artifacts for suite runs.
// Purpose: Persist deterministic, reviewable records of each run.
// Dependencies: serde, serde_jcs, thiserror
// ============================================================================

//! ## Overview
//! [`RunArtifacts`] owns the artifact directory for one run and writes the
//! suite summary as canonical JSON (JCS) and Markdown, plus the HTTP
//! transcript. A run that aborted in setup still gets a summary describing
//! the failed setup step.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::audit::now_millis;
use crate::client::TranscriptEntry;
use crate::runner::StepKind;
use crate::runner::StepReport;
use crate::runner::SuiteReport;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Summary JSON file name.
pub const SUMMARY_JSON: &str = "summary.json";
/// Summary Markdown file name.
pub const SUMMARY_MD: &str = "summary.md";
/// Transcript JSON file name.
pub const TRANSCRIPT_JSON: &str = "transcript.json";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Artifact write failures.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Filesystem failure.
    #[error("artifact io error at {path}: {source}")]
    Io {
        /// Path being written.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// Serialization failure.
    #[error("artifact serialization failed: {0}")]
    Serialize(String),
}

// ============================================================================
// SECTION: Artifacts
// ============================================================================

/// Artifact directory for one run.
#[derive(Debug, Clone)]
pub struct RunArtifacts {
    /// Directory holding every artifact of the run.
    root: PathBuf,
}

impl RunArtifacts {
    /// Creates (if needed) the artifact root.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Io`] when the directory cannot be created.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, ReportError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| ReportError::Io {
            path: root.clone(),
            source,
        })?;
        Ok(Self {
            root,
        })
    }

    /// Default artifact root: `target/market-contract/run_<ms>`.
    #[must_use]
    pub fn default_root() -> PathBuf {
        PathBuf::from("target/market-contract").join(format!("run_{}", now_millis()))
    }

    /// Returns the artifact root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes a JSON artifact using canonical JCS serialization.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] on serialization or write failure.
    pub fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<PathBuf, ReportError> {
        let bytes = serde_jcs::to_vec(value).map_err(|err| ReportError::Serialize(err.to_string()))?;
        self.write_bytes(name, &bytes)
    }

    /// Writes a UTF-8 text artifact.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Io`] on write failure.
    pub fn write_text(&self, name: &str, value: &str) -> Result<PathBuf, ReportError> {
        self.write_bytes(name, value.as_bytes())
    }

    /// Writes summary JSON, summary Markdown, and the transcript.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] when any artifact cannot be written.
    pub fn write_suite(
        &self,
        report: &SuiteReport,
        transcript: &[TranscriptEntry],
    ) -> Result<Vec<PathBuf>, ReportError> {
        Ok(vec![
            self.write_json(SUMMARY_JSON, report)?,
            self.write_text(SUMMARY_MD, &summary_markdown(report))?,
            self.write_json(TRANSCRIPT_JSON, &transcript)?,
        ])
    }

    /// Writes artifacts for a run that aborted in setup.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] when any artifact cannot be written.
    pub fn write_aborted(
        &self,
        suite: &str,
        setup: &StepReport,
        transcript: &[TranscriptEntry],
    ) -> Result<Vec<PathBuf>, ReportError> {
        let summary = AbortedSummary {
            suite,
            aborted: true,
            setup,
        };
        let mut markdown = String::new();
        let _ = writeln!(markdown, "# Contract Run Summary\n");
        let _ = writeln!(markdown, "- Suite: {suite}");
        let _ = writeln!(markdown, "- Status: aborted in setup\n");
        push_step_table(&mut markdown, std::iter::once(setup));
        Ok(vec![
            self.write_json(SUMMARY_JSON, &summary)?,
            self.write_text(SUMMARY_MD, &markdown)?,
            self.write_json(TRANSCRIPT_JSON, &transcript)?,
        ])
    }

    /// Writes raw bytes under the artifact root.
    fn write_bytes(&self, name: &str, bytes: &[u8]) -> Result<PathBuf, ReportError> {
        let path = self.root.join(name);
        fs::write(&path, bytes).map_err(|source| ReportError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

/// Summary payload for a run that never got past setup.
#[derive(Serialize)]
struct AbortedSummary<'a> {
    /// Suite name.
    suite: &'a str,
    /// Always true.
    aborted: bool,
    /// Failed setup step.
    setup: &'a StepReport,
}

// ============================================================================
// SECTION: Markdown
// ============================================================================

/// Renders the Markdown summary of a suite run.
#[must_use]
pub fn summary_markdown(report: &SuiteReport) -> String {
    let mut out = String::new();
    let status = if report.passed() { "passed" } else { "failed" };
    let _ = writeln!(out, "# Contract Run Summary\n");
    let _ = writeln!(out, "- Suite: {}", report.suite);
    let _ = writeln!(out, "- Base URL: {}", report.base_url);
    let _ = writeln!(out, "- Market: {}", report.market_name);
    if let Some(id) = &report.market_id {
        let _ = writeln!(out, "- Market id: {id}");
    }
    let _ = writeln!(out, "- Status: {status}");
    let _ = writeln!(
        out,
        "- Steps: {} passed, {} failed",
        report.passed_count(),
        report.failed_count()
    );
    let _ = writeln!(out, "- Duration (ms): {}\n", report.duration_ms);
    push_step_table(&mut out, report.steps());
    out
}

/// Appends a Markdown table of steps.
fn push_step_table<'a>(out: &mut String, steps: impl Iterator<Item = &'a StepReport>) {
    out.push_str("| Step | Name | Request | Status | Outcome |\n");
    out.push_str("|------|------|---------|--------|---------|\n");
    for step in steps {
        let label = step_label(step);
        let request = format!("{} {}", step.method, step.url.as_deref().unwrap_or("-"));
        let status = step.status.map_or_else(|| "-".to_string(), |status| status.to_string());
        let outcome = step.outcome.detail().map_or_else(
            || step.outcome.label().to_string(),
            |detail| format!("{}: {}", step.outcome.label(), detail.replace('|', "\\|")),
        );
        let _ = writeln!(out, "| {label} | {} | {request} | {status} | {outcome} |", step.name);
    }
}

/// Short label for a step's position in the run.
#[must_use]
pub fn step_label(step: &StepReport) -> String {
    match (step.kind, step.number) {
        (StepKind::Setup, _) => "setup".to_string(),
        (StepKind::Teardown, _) => "teardown".to_string(),
        (StepKind::Scenario, Some(number)) => format!("{number:02}"),
        (StepKind::Scenario, None) => "--".to_string(),
    }
}
