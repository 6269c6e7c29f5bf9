// crates/market-contract/src/audit.rs
// ============================================================================
// Module: Run Logging
// Description: Structured run events for suite execution.
// Purpose: Emit JSON-lines progress logs without hard dependencies.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! This module defines the run event payload and the sinks that receive it.
//! Events are serialized as one JSON object per line so they can be routed to
//! any log pipeline. Sinks never fail the run: serialization or write errors
//! are dropped.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Run event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunEvent {
    /// Event identifier (`suite_started`, `scenario_finished`, ...).
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u64,
    /// Suite name.
    pub suite: String,
    /// 1-based scenario number when the event concerns a scenario.
    pub step: Option<usize>,
    /// Step name when the event concerns a step.
    pub name: Option<String>,
    /// Outcome label (`passed`, `failed`, `error`).
    pub outcome: Option<&'static str>,
    /// Response status when one arrived.
    pub status: Option<u16>,
    /// Failure detail or free-form note.
    pub detail: Option<String>,
}

impl RunEvent {
    /// Creates an event with only the identifier and suite set.
    #[must_use]
    pub fn new(event: &'static str, suite: impl Into<String>) -> Self {
        Self {
            event,
            timestamp_ms: now_millis(),
            suite: suite.into(),
            step: None,
            name: None,
            outcome: None,
            status: None,
            detail: None,
        }
    }
}

/// Milliseconds since the Unix epoch.
#[must_use]
pub fn now_millis() -> u64 {
    duration_millis(SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default())
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
///
/// Report fields stay `u64` because canonical JSON has no 128-bit integers.
#[must_use]
pub fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Sink for run events.
pub trait RunLogSink: Send + Sync {
    /// Record a run event.
    fn record(&self, event: &RunEvent);
}

/// Sink that logs JSON lines to stderr.
pub struct StderrRunLog;

impl RunLogSink for StderrRunLog {
    fn record(&self, event: &RunEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Sink that appends JSON lines to a file.
pub struct FileRunLog {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileRunLog {
    /// Opens the log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl RunLogSink for FileRunLog {
    fn record(&self, event: &RunEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// Sink that keeps events in memory.
#[derive(Default)]
pub struct MemoryRunLog {
    /// Recorded events in arrival order.
    events: Mutex<Vec<RunEvent>>,
}

impl MemoryRunLog {
    /// Creates an empty in-memory sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<RunEvent> {
        self.events.lock().map_or_else(|_| Vec::new(), |events| events.clone())
    }
}

impl RunLogSink for MemoryRunLog {
    fn record(&self, event: &RunEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

/// Sink that forwards each event to several sinks.
#[derive(Default)]
pub struct MultiRunLog {
    /// Downstream sinks, called in order.
    sinks: Vec<Box<dyn RunLogSink>>,
}

impl MultiRunLog {
    /// Creates an empty fan-out sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a downstream sink.
    #[must_use]
    pub fn with(mut self, sink: Box<dyn RunLogSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Returns true when no sink is attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl RunLogSink for MultiRunLog {
    fn record(&self, event: &RunEvent) {
        for sink in &self.sinks {
            sink.record(event);
        }
    }
}

/// No-op sink.
pub struct NoopRunLog;

impl RunLogSink for NoopRunLog {
    fn record(&self, _event: &RunEvent) {}
}
