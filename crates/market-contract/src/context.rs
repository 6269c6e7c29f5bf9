// crates/market-contract/src/context.rs
// ============================================================================
// Module: Suite Context
// Description: Explicit fixture state threaded through a suite run.
// Purpose: Resolve scenario paths, bodies, and messages against the fixture.
// Dependencies: serde_json, thiserror
// ============================================================================

//! ## Overview
//! [`SuiteContext`] holds the base URL, the fresh market name used by this
//! run, and the fixture id once setup has captured it. Every scenario is
//! resolved against the context instead of shared outer-scope state.
//! Invariants:
//! - The fixture id is written at most once per context.
//! - Paths that need the fixture fail to resolve until the id is captured.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use thiserror::Error;

use crate::identifiers::MarketId;
use crate::scenario::ScenarioPath;
use crate::scenario::Template;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while resolving a scenario against the context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    /// The path references the fixture but setup has not captured an id.
    #[error("scenario targets the fixture market but no market id was captured")]
    MissingFixture,
    /// The fixture id was already captured for this run.
    #[error("fixture market id already captured as {0}")]
    FixtureAlreadySet(MarketId),
}

// ============================================================================
// SECTION: Context
// ============================================================================

/// Per-run fixture state passed into every scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteContext {
    /// Market collection base URL without trailing slash.
    base_url: String,
    /// Market name used for the fixture and duplicate checks.
    market_name: String,
    /// Fixture id captured by setup.
    market_id: Option<MarketId>,
}

impl SuiteContext {
    /// Creates a context for one run.
    #[must_use]
    pub fn new(base_url: impl Into<String>, market_name: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            market_name: market_name.into(),
            market_id: None,
        }
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the fixture market name.
    #[must_use]
    pub fn market_name(&self) -> &str {
        &self.market_name
    }

    /// Returns the fixture id when setup captured one.
    #[must_use]
    pub const fn market_id(&self) -> Option<&MarketId> {
        self.market_id.as_ref()
    }

    /// Stores the fixture id captured by setup.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::FixtureAlreadySet`] on a second capture.
    pub fn capture_market_id(&mut self, id: MarketId) -> Result<(), ContextError> {
        if let Some(existing) = &self.market_id {
            return Err(ContextError::FixtureAlreadySet(existing.clone()));
        }
        self.market_id = Some(id);
        Ok(())
    }

    /// Resolves a scenario path to an absolute URL.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::MissingFixture`] when the path needs the
    /// fixture id and none was captured.
    pub fn resolve_url(&self, path: &ScenarioPath) -> Result<String, ContextError> {
        match path {
            ScenarioPath::Collection => Ok(self.base_url.clone()),
            ScenarioPath::FixtureMarket {
                suffix,
            } => {
                let id = self.market_id.as_ref().ok_or(ContextError::MissingFixture)?;
                Ok(format!("{}/{id}{suffix}", self.base_url))
            }
            ScenarioPath::Market {
                id,
                suffix,
            } => Ok(format!("{}/{id}{suffix}", self.base_url)),
        }
    }

    /// Renders a message template against the fixture.
    #[must_use]
    pub fn render(&self, template: &Template) -> String {
        template.render(&self.market_name, self.market_id.as_ref())
    }

    /// Renders every string leaf of a JSON body as a template.
    #[must_use]
    pub fn render_body(&self, body: &Value) -> Value {
        match body {
            Value::String(text) => Value::String(self.render(&Template::new(text.as_str()))),
            Value::Array(items) => {
                Value::Array(items.iter().map(|item| self.render_body(item)).collect())
            }
            Value::Object(fields) => Value::Object(
                fields.iter().map(|(key, value)| (key.clone(), self.render_body(value))).collect(),
            ),
            other => other.clone(),
        }
    }
}
