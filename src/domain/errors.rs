use thiserror::Error;

/// Errors raised while decomposing a table identifier into market metadata
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseFailure {
    #[error("Identifier '{identifier}' has {segments} segments, expected at least 4")]
    TooFewSegments { identifier: String, segments: usize },

    #[error("Identifier '{identifier}' has an empty {segment} segment")]
    EmptySegment {
        identifier: String,
        segment: &'static str,
    },
}

/// Errors related to table and column names that are spliced into queries
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("Identifier is empty")]
    Empty,

    #[error("Identifier '{identifier}' contains forbidden character {character:?}")]
    ForbiddenCharacter { identifier: String, character: char },
}

/// Errors related to binding human-readable times to store timestamps
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeWindowError {
    #[error("Unrecognised date-time '{input}'")]
    InvalidDateTime { input: String },

    #[error("Invalid timestamp unit '{0}'. Must be 's' or 'ms'")]
    InvalidUnit(String),
}

/// A statistic that cannot be computed from the supplied sample.
///
/// Reported as an explicit "undefined" result; never coerced to zero or infinity.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DegenerateStatistic {
    #[error("{metric}: need at least 2 historical values, got {len}")]
    InsufficientHistory { metric: String, len: usize },

    #[error("{metric}: zero standard deviation (mean {mean:.4})")]
    ZeroDeviation { metric: String, mean: f64 },

    #[error("{metric}: no target observation")]
    MissingTarget { metric: String },
}

/// Errors reported by a candle store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Table not found: {table}")]
    MissingTable { table: String },

    #[error("Could not connect to {exchange}: {reason}")]
    Connection { exchange: String, reason: String },

    #[error("Query failed on {table}: {reason}")]
    Query { table: String, reason: String },
}
