// crates/market-contract/src/assertions.rs
// ============================================================================
// Module: Response Assertions
// Description: Status and body checks for scenario expectations.
// Purpose: Turn an exchange and an expectation into attributed failures.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! [`check_expectation`] compares a response against a scenario expectation
//! and returns every mismatch it finds. Mismatches are data rather than
//! errors so the runner can record them and move on.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::client::HttpExchange;
use crate::context::SuiteContext;
use crate::scenario::BodyExpectation;
use crate::scenario::Expectation;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum number of body characters quoted in failure messages.
pub const BODY_EXCERPT_CHARS: usize = 200;

// ============================================================================
// SECTION: Failure Types
// ============================================================================

/// A single unmet expectation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssertionFailure {
    /// Status code differs from the expected one.
    Status {
        /// Expected status code.
        expected: u16,
        /// Received status code.
        actual: u16,
    },
    /// Body does not contain the expected fragment.
    BodyMissingFragment {
        /// Rendered fragment.
        fragment: String,
        /// Truncated body text.
        body: String,
    },
    /// Body does not equal the expected text.
    BodyMismatch {
        /// Rendered expected body.
        expected: String,
        /// Truncated body text.
        body: String,
    },
    /// Body is not JSON but a JSON field was asserted.
    BodyNotJson {
        /// Asserted pointer.
        pointer: String,
    },
    /// JSON pointer does not resolve.
    JsonFieldMissing {
        /// Asserted pointer.
        pointer: String,
    },
    /// JSON pointer resolves to a different value.
    JsonFieldMismatch {
        /// Asserted pointer.
        pointer: String,
        /// Expected value.
        expected: Value,
        /// Received value.
        actual: Value,
    },
}

impl fmt::Display for AssertionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status {
                expected,
                actual,
            } => write!(f, "expected status {expected}, got {actual}"),
            Self::BodyMissingFragment {
                fragment,
                body,
            } => write!(f, "body does not contain \"{fragment}\" (body: {body})"),
            Self::BodyMismatch {
                expected,
                body,
            } => write!(f, "body differs from \"{expected}\" (body: {body})"),
            Self::BodyNotJson {
                pointer,
            } => write!(f, "body is not json; cannot read {pointer}"),
            Self::JsonFieldMissing {
                pointer,
            } => write!(f, "json field {pointer} is missing"),
            Self::JsonFieldMismatch {
                pointer,
                expected,
                actual,
            } => write!(f, "json field {pointer} expected {expected}, got {actual}"),
        }
    }
}

// ============================================================================
// SECTION: Checks
// ============================================================================

/// Checks an exchange against an expectation. Empty result means pass.
#[must_use]
pub fn check_expectation(
    expectation: &Expectation,
    context: &SuiteContext,
    exchange: &HttpExchange,
) -> Vec<AssertionFailure> {
    let mut failures = Vec::new();
    if exchange.status != expectation.status {
        failures.push(AssertionFailure::Status {
            expected: expectation.status.as_u16(),
            actual: exchange.status.as_u16(),
        });
    }
    for body in &expectation.body {
        if let Some(failure) = check_body(body, context, exchange) {
            failures.push(failure);
        }
    }
    failures
}

/// Checks one body expectation.
fn check_body(
    expectation: &BodyExpectation,
    context: &SuiteContext,
    exchange: &HttpExchange,
) -> Option<AssertionFailure> {
    match expectation {
        BodyExpectation::Contains(template) => {
            let fragment = context.render(template);
            if body_contains(exchange, &fragment) {
                None
            } else {
                Some(AssertionFailure::BodyMissingFragment {
                    fragment,
                    body: excerpt(&exchange.body),
                })
            }
        }
        BodyExpectation::Equals(template) => {
            let expected = context.render(template);
            if exchange.body.trim() == expected.trim() {
                None
            } else {
                Some(AssertionFailure::BodyMismatch {
                    expected,
                    body: excerpt(&exchange.body),
                })
            }
        }
        BodyExpectation::JsonField {
            pointer,
            value,
        } => {
            let Some(json) = &exchange.json else {
                return Some(AssertionFailure::BodyNotJson {
                    pointer: pointer.clone(),
                });
            };
            let Some(actual) = json.pointer(pointer) else {
                return Some(AssertionFailure::JsonFieldMissing {
                    pointer: pointer.clone(),
                });
            };
            match value {
                Some(expected) if expected != actual => Some(AssertionFailure::JsonFieldMismatch {
                    pointer: pointer.clone(),
                    expected: expected.clone(),
                    actual: actual.clone(),
                }),
                _ => None,
            }
        }
    }
}

/// Returns true when the raw body or any decoded JSON string contains `fragment`.
///
/// JSON bodies may escape non-ASCII text, so decoded strings are searched too.
fn body_contains(exchange: &HttpExchange, fragment: &str) -> bool {
    if exchange.body.contains(fragment) {
        return true;
    }
    exchange.json.as_ref().is_some_and(|json| json_contains(json, fragment))
}

/// Searches every string leaf of a JSON value.
fn json_contains(value: &Value, fragment: &str) -> bool {
    match value {
        Value::String(text) => text.contains(fragment),
        Value::Array(items) => items.iter().any(|item| json_contains(item, fragment)),
        Value::Object(fields) => fields.values().any(|item| json_contains(item, fragment)),
        _ => false,
    }
}

/// Truncates body text for failure messages on a char boundary.
#[must_use]
pub fn excerpt(body: &str) -> String {
    let mut chars = body.chars();
    let head: String = chars.by_ref().take(BODY_EXCERPT_CHARS).collect();
    if chars.next().is_some() { format!("{head}...") } else { head }
}
