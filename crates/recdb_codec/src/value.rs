//! Typed field values.

use serde::Serialize;
use std::fmt;

/// A typed view of a persisted field value.
///
/// Records persist every field as a string; joins need type-aware
/// comparison so that `"1"` and `"1.0"` match as numbers rather than
/// diverging as text. `FieldValue` is the closed set of scalar kinds
/// that comparison supports.
///
/// Serialized untagged, so merged join rows render as native JSON
/// scalars at the CLI boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Boolean value (`"true"` / `"false"` in persisted form).
    Bool(bool),
    /// Numeric value (any finite f64 in persisted form).
    Number(f64),
    /// Text value (everything else).
    Text(String),
}

impl FieldValue {
    /// Parses a persisted string into its typed interpretation.
    ///
    /// Boolean literals win over numbers, numbers over text. Non-finite
    /// numeric spellings (`"NaN"`, `"inf"`) stay text so equality stays
    /// reflexive.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "true" => return Self::Bool(true),
            "false" => return Self::Bool(false),
            _ => {}
        }
        match raw.parse::<f64>() {
            Ok(n) if n.is_finite() => Self::Number(n),
            _ => Self::Text(raw.to_string()),
        }
    }

    /// Type-aware equality between two values.
    ///
    /// Values of different kinds never match.
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}
