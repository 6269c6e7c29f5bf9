// crates/market-contract/src/scenario.rs
// ============================================================================
// Module: Scenario Model
// Description: Declarative request/expectation pairs and ordered suites.
// Purpose: Describe HTTP exchanges without executing them.
// Dependencies: reqwest, serde, serde_json
// ============================================================================

//! ## Overview
//! A [`Scenario`] describes one HTTP exchange: method, path, optional JSON
//! body, and the expected response. A [`ScenarioSuite`] bundles the setup
//! request, the ordered scenarios, and the teardown request.
//! Invariants:
//! - Scenarios are immutable once built; executing them never mutates them.
//! - Suite order is the declaration order of `scenarios`.
//! - Paths and message templates refer to the fixture only through
//!   [`ScenarioPath::FixtureMarket`] and the `{id}`/`{nome}` placeholders.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;

use crate::identifiers::MarketId;

// ============================================================================
// SECTION: Templates
// ============================================================================

/// Placeholder replaced by the fixture market name.
pub const NAME_PLACEHOLDER: &str = "{nome}";
/// Placeholder replaced by the fixture market id.
pub const ID_PLACEHOLDER: &str = "{id}";

/// Text with `{nome}` and `{id}` placeholders resolved against the fixture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Template(String);

impl Template {
    /// Creates a template from raw text.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Returns the raw template text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Renders the template. `{id}` stays verbatim while no id is known.
    #[must_use]
    pub fn render(&self, name: &str, id: Option<&MarketId>) -> String {
        let rendered = self.0.replace(NAME_PLACEHOLDER, name);
        match id {
            Some(id) => rendered.replace(ID_PLACEHOLDER, id.as_str()),
            None => rendered,
        }
    }
}

impl From<&str> for Template {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// SECTION: Request Description
// ============================================================================

/// HTTP methods used by the market API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET request.
    Get,
    /// POST request.
    Post,
    /// PUT request.
    Put,
    /// DELETE request.
    Delete,
}

impl HttpMethod {
    /// Returns the canonical method token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request path relative to the market collection base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioPath {
    /// The market collection itself (`{base}`).
    Collection,
    /// A path under the fixture market (`{base}/{id}{suffix}`).
    FixtureMarket {
        /// Suffix appended after the id; empty or starting with `/`.
        suffix: String,
    },
    /// A path under an explicit market id (`{base}/<id>{suffix}`).
    Market {
        /// Market id placed in the path.
        id: MarketId,
        /// Suffix appended after the id; empty or starting with `/`.
        suffix: String,
    },
}

impl ScenarioPath {
    /// Path of the fixture market itself.
    #[must_use]
    pub const fn fixture() -> Self {
        Self::FixtureMarket {
            suffix: String::new(),
        }
    }

    /// Path of a sub-resource under the fixture market.
    #[must_use]
    pub fn fixture_child(suffix: impl Into<String>) -> Self {
        Self::FixtureMarket {
            suffix: suffix.into(),
        }
    }

    /// Path of an explicit market id.
    #[must_use]
    pub const fn market(id: MarketId) -> Self {
        Self::Market {
            id,
            suffix: String::new(),
        }
    }

    /// Returns true when resolving this path needs the fixture id.
    #[must_use]
    pub const fn needs_fixture(&self) -> bool {
        matches!(self, Self::FixtureMarket { .. })
    }
}

impl fmt::Display for ScenarioPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Collection => f.write_str("{base}"),
            Self::FixtureMarket {
                suffix,
            } => write!(f, "{{base}}/{ID_PLACEHOLDER}{suffix}"),
            Self::Market {
                id,
                suffix,
            } => write!(f, "{{base}}/{id}{suffix}"),
        }
    }
}

// ============================================================================
// SECTION: Expectations
// ============================================================================

/// Assertion applied to a response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyExpectation {
    /// Body text (or any JSON string inside it) contains the rendered fragment.
    Contains(Template),
    /// Body text equals the rendered template after trimming whitespace.
    Equals(Template),
    /// JSON pointer resolves; when `value` is set, it must equal that value.
    JsonField {
        /// RFC 6901 pointer into the response body.
        pointer: String,
        /// Expected value, or `None` to only require presence.
        value: Option<Value>,
    },
}

impl fmt::Display for BodyExpectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Contains(template) => write!(f, "body contains \"{template}\""),
            Self::Equals(template) => write!(f, "body equals \"{template}\""),
            Self::JsonField {
                pointer,
                value: Some(value),
            } => write!(f, "json {pointer} == {value}"),
            Self::JsonField {
                pointer,
                value: None,
            } => write!(f, "json {pointer} present"),
        }
    }
}

/// Expected response for a scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expectation {
    /// Expected status code.
    pub status: StatusCode,
    /// Body assertions, checked in order.
    pub body: Vec<BodyExpectation>,
}

impl Expectation {
    /// Expectation on status only.
    #[must_use]
    pub const fn status(status: StatusCode) -> Self {
        Self {
            status,
            body: Vec::new(),
        }
    }
}

// ============================================================================
// SECTION: Scenarios
// ============================================================================

/// One declarative HTTP exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    /// Human-readable scenario name.
    pub name: String,
    /// HTTP method.
    pub method: HttpMethod,
    /// Request path.
    pub path: ScenarioPath,
    /// Optional JSON body; string leaves are rendered as templates.
    pub body: Option<Value>,
    /// Expected response.
    pub expect: Expectation,
}

impl Scenario {
    /// Creates a scenario expecting `200 OK` until told otherwise.
    #[must_use]
    pub fn new(name: impl Into<String>, method: HttpMethod, path: ScenarioPath) -> Self {
        Self {
            name: name.into(),
            method,
            path,
            body: None,
            expect: Expectation::status(StatusCode::OK),
        }
    }

    /// GET scenario.
    #[must_use]
    pub fn get(name: impl Into<String>, path: ScenarioPath) -> Self {
        Self::new(name, HttpMethod::Get, path)
    }

    /// POST scenario.
    #[must_use]
    pub fn post(name: impl Into<String>, path: ScenarioPath) -> Self {
        Self::new(name, HttpMethod::Post, path)
    }

    /// PUT scenario.
    #[must_use]
    pub fn put(name: impl Into<String>, path: ScenarioPath) -> Self {
        Self::new(name, HttpMethod::Put, path)
    }

    /// DELETE scenario.
    #[must_use]
    pub fn delete(name: impl Into<String>, path: ScenarioPath) -> Self {
        Self::new(name, HttpMethod::Delete, path)
    }

    /// Attaches a JSON request body.
    #[must_use]
    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Sets the expected status code.
    #[must_use]
    pub fn expect_status(mut self, status: StatusCode) -> Self {
        self.expect.status = status;
        self
    }

    /// Requires the body to contain the rendered fragment.
    #[must_use]
    pub fn expect_body_contains(mut self, fragment: impl Into<Template>) -> Self {
        self.expect.body.push(BodyExpectation::Contains(fragment.into()));
        self
    }

    /// Requires the trimmed body to equal the rendered template.
    #[must_use]
    pub fn expect_body_equals(mut self, body: impl Into<Template>) -> Self {
        self.expect.body.push(BodyExpectation::Equals(body.into()));
        self
    }

    /// Requires a JSON pointer to resolve, optionally to a specific value.
    #[must_use]
    pub fn expect_json_field(mut self, pointer: impl Into<String>, value: Option<Value>) -> Self {
        self.expect.body.push(BodyExpectation::JsonField {
            pointer: pointer.into(),
            value,
        });
        self
    }

    /// One-line description: method, path, and expected status.
    #[must_use]
    pub fn describe(&self) -> String {
        format!("{} {} -> {}", self.method, self.path, self.expect.status.as_u16())
    }
}

/// Fixture creation step.
#[derive(Debug, Clone, PartialEq)]
pub struct SetupStep {
    /// Creation request and its expected response.
    pub request: Scenario,
    /// JSON pointer locating the created id in the response body.
    pub id_pointer: String,
}

/// Ordered suite: setup, scenarios, teardown.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioSuite {
    /// Suite name used in logs and reports.
    pub name: String,
    /// Fixture creation step.
    pub setup: SetupStep,
    /// Scenarios in execution order.
    pub scenarios: Vec<Scenario>,
    /// Fixture deletion step.
    pub teardown: Scenario,
}

impl ScenarioSuite {
    /// Scenarios paired with their 1-based step numbers, in execution order.
    pub fn numbered(&self) -> impl Iterator<Item = (usize, &Scenario)> {
        self.scenarios.iter().enumerate().map(|(index, scenario)| (index + 1, scenario))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
