// crates/market-contract/src/identifiers.rs
// ============================================================================
// Module: Market Identifiers
// Description: Opaque identifier for markets assigned by the remote API.
// Purpose: Keep server-assigned ids typed as they flow into scenario URLs.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! The remote API assigns market identifiers on creation. They arrive as JSON
//! numbers or strings and are only ever echoed back into request paths, so
//! they are kept as their canonical text form.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Market identifier as assigned by the remote API.
///
/// # Invariants
/// - Never empty and free of `/`, `?`, `#`, `%`, `\\`, whitespace, and
///   control characters, so it is always one literal path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarketId(String);

impl MarketId {
    /// Creates a market identifier from its text form (returns `None` when it
    /// is blank or would span more than one path segment).
    #[must_use]
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() || trimmed.chars().any(breaks_segment) {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    /// Creates a market identifier from a numeric id.
    #[must_use]
    pub fn from_number(id: u64) -> Self {
        Self(id.to_string())
    }

    /// Extracts an identifier from a JSON value (integer or string).
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => {
                number.as_u64().map(Self::from_number).or_else(|| Self::new(number.to_string()))
            }
            Value::String(text) => Self::new(text.as_str()),
            _ => None,
        }
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Characters that would split, escape, or end a URL path segment.
fn breaks_segment(ch: char) -> bool {
    matches!(ch, '/' | '?' | '#' | '%' | '\\') || ch.is_whitespace() || ch.is_control()
}

impl fmt::Display for MarketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
