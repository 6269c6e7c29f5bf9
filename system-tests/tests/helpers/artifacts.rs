// system-tests/tests/helpers/artifacts.rs
// ============================================================================
// Module: Test Artifacts
// Description: Per-test artifact roots and summaries for system-tests.
// Purpose: Keep suite reports and a test verdict side by side on disk.
// Dependencies: system-tests, market-contract, serde, serde_jcs
// ============================================================================

use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use market_contract::RunArtifacts;
use market_contract::audit::now_millis;
use serde::Serialize;
use system_tests::config::SystemTestConfig;

/// Verdict written next to the suite artifacts.
#[derive(Debug, Serialize)]
struct TestSummary {
    test_name: String,
    status: String,
    started_at_ms: u64,
    duration_ms: u64,
    notes: Vec<String>,
}

/// Artifact directory for one system test.
#[derive(Debug, Clone)]
pub struct TestArtifacts {
    root: PathBuf,
}

impl TestArtifacts {
    /// Creates `<run root>/<test name>`.
    pub fn new(test_name: &str) -> io::Result<Self> {
        let config = SystemTestConfig::load().map_err(io::Error::other)?;
        let base = config.run_root.unwrap_or_else(|| {
            PathBuf::from("target/system-tests").join(format!("run_{}", now_millis()))
        });
        let root = base.join(test_name);
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
        })
    }

    /// Returns the root directory for the test artifacts.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Artifact writer for the suite run under `<root>/run`.
    pub fn suite_run(&self) -> io::Result<RunArtifacts> {
        RunArtifacts::new(self.root.join("run")).map_err(io::Error::other)
    }

    /// Writes a JSON artifact using canonical JCS serialization.
    pub fn write_json<T: Serialize>(&self, name: &str, value: &T) -> io::Result<PathBuf> {
        let path = self.root.join(name);
        let bytes = serde_jcs::to_vec(value).map_err(io::Error::other)?;
        fs::write(&path, bytes)?;
        Ok(path)
    }
}

/// Writes a verdict even when the test panics.
pub struct TestReporter {
    artifacts: TestArtifacts,
    test_name: String,
    started_at_ms: u64,
    finalized: bool,
}

impl TestReporter {
    /// Creates a reporter for the named test.
    pub fn new(test_name: &str) -> io::Result<Self> {
        Ok(Self {
            artifacts: TestArtifacts::new(test_name)?,
            test_name: test_name.to_string(),
            started_at_ms: now_millis(),
            finalized: false,
        })
    }

    /// Returns the artifact manager.
    pub fn artifacts(&self) -> &TestArtifacts {
        &self.artifacts
    }

    /// Writes `test.json` and `test.md`.
    pub fn finish(&mut self, status: &str, notes: Vec<String>) -> io::Result<()> {
        let summary = TestSummary {
            test_name: self.test_name.clone(),
            status: status.to_string(),
            started_at_ms: self.started_at_ms,
            duration_ms: now_millis().saturating_sub(self.started_at_ms),
            notes,
        };
        self.artifacts.write_json("test.json", &summary)?;
        fs::write(self.artifacts.root().join("test.md"), verdict_markdown(&summary))?;
        self.finalized = true;
        Ok(())
    }
}

impl Drop for TestReporter {
    fn drop(&mut self) {
        if self.finalized {
            return;
        }
        let status = if std::thread::panicking() { "panic" } else { "unknown" };
        let _ = self.finish(status, vec!["test ended without an explicit verdict".to_string()]);
    }
}

fn verdict_markdown(summary: &TestSummary) -> String {
    let mut out = String::from("# System-Test Verdict\n\n");
    let _ = writeln!(out, "- Test: {}", summary.test_name);
    let _ = writeln!(out, "- Status: {}", summary.status);
    let _ = writeln!(out, "- Duration (ms): {}\n", summary.duration_ms);
    out.push_str("## Notes\n\n");
    if summary.notes.is_empty() {
        out.push_str("- None\n");
    }
    for note in &summary.notes {
        let _ = writeln!(out, "- {note}");
    }
    out
}
