//! Validated names for stored tables and columns.
//!
//! Table and column names cannot be bound as query parameters, so every name
//! that reaches SQL text goes through one of these types first.

use crate::domain::errors::IdentifierError;
use crate::domain::market::market_key::INSTRUMENT_SEPARATOR;
use serde::Serialize;
use std::fmt;

/// Name of a stored candle table, restricted to `[A-Za-z0-9_:-]`.
///
/// Whitespace and `.` mark ingestion artifacts and are rejected here, so a
/// `TableIdentifier` can never carry them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TableIdentifier(String);

impl TableIdentifier {
    pub fn new(raw: impl Into<String>) -> Result<Self, IdentifierError> {
        let raw = raw.into();
        validate(&raw, |c| {
            c.is_ascii_alphanumeric() || matches!(c, '_' | ':' | '-')
        })?;
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_derivative(&self) -> bool {
        self.0.contains(INSTRUMENT_SEPARATOR)
    }

    /// Double-quoted form, safe to use as an SQL identifier.
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0)
    }
}

impl fmt::Display for TableIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TableIdentifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for TableIdentifier {
    type Error = IdentifierError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Name of a candle column, restricted to `[A-Za-z0-9_]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnName(String);

impl ColumnName {
    pub fn new(raw: impl Into<String>) -> Result<Self, IdentifierError> {
        let raw = raw.into();
        validate(&raw, |c| c.is_ascii_alphanumeric() || c == '_')?;
        Ok(Self(raw))
    }

    /// Built-in names known to be valid.
    pub(crate) fn from_static(raw: &'static str) -> Self {
        debug_assert!(raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
        Self(raw.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0)
    }
}

impl fmt::Display for ColumnName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn validate(raw: &str, allowed: impl Fn(char) -> bool) -> Result<(), IdentifierError> {
    if raw.is_empty() {
        return Err(IdentifierError::Empty);
    }
    match raw.chars().find(|c| !allowed(*c)) {
        Some(character) => Err(IdentifierError::ForbiddenCharacter {
            identifier: raw.to_string(),
            character,
        }),
        None => Ok(()),
    }
}
