//! Binding human-readable date-times to the store's epoch representation.
//!
//! Stored timestamps carry no unit; the caller declares whether a data source
//! counts seconds or milliseconds. Windows are bound once per run and reused
//! unchanged for every table queried in that run.

use crate::domain::errors::TimeWindowError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Unit of a stored epoch timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimestampUnit {
    Seconds,
    #[default]
    Milliseconds,
}

impl TimestampUnit {
    /// Epoch value of `instant`, truncated to an integer in this unit.
    pub fn from_datetime(&self, instant: DateTime<Utc>) -> i64 {
        match self {
            TimestampUnit::Seconds => instant.timestamp(),
            TimestampUnit::Milliseconds => instant.timestamp_millis(),
        }
    }

    pub fn to_datetime(&self, timestamp: i64) -> Option<DateTime<Utc>> {
        match self {
            TimestampUnit::Seconds => DateTime::from_timestamp(timestamp, 0),
            TimestampUnit::Milliseconds => DateTime::from_timestamp_millis(timestamp),
        }
    }

    /// Number of ticks of this unit in one second.
    pub fn per_second(&self) -> i64 {
        match self {
            TimestampUnit::Seconds => 1,
            TimestampUnit::Milliseconds => 1000,
        }
    }

    /// UTC calendar day containing `timestamp`.
    pub fn day_of(&self, timestamp: i64) -> Option<NaiveDate> {
        self.to_datetime(timestamp).map(|dt| dt.date_naive())
    }
}

impl FromStr for TimestampUnit {
    type Err = TimeWindowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "s" | "sec" | "seconds" => Ok(TimestampUnit::Seconds),
            "ms" | "millis" | "milliseconds" => Ok(TimestampUnit::Milliseconds),
            _ => Err(TimeWindowError::InvalidUnit(s.to_string())),
        }
    }
}

impl fmt::Display for TimestampUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampUnit::Seconds => f.write_str("s"),
            TimestampUnit::Milliseconds => f.write_str("ms"),
        }
    }
}

/// Parses a date-time string as an absolute instant.
///
/// Strings without an offset are read as UTC. A bare date means midnight.
pub fn parse_datetime(input: &str) -> Result<DateTime<Utc>, TimeWindowError> {
    let trimmed = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }

    Err(TimeWindowError::InvalidDateTime {
        input: input.to_string(),
    })
}

/// Inclusive timestamp range; either side may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: Option<i64>,
    end: Option<i64>,
    unit: TimestampUnit,
}

impl TimeWindow {
    pub fn new(start: Option<i64>, end: Option<i64>, unit: TimestampUnit) -> Self {
        Self { start, end, unit }
    }

    /// Binds human-readable bounds. `None` or a blank string leaves that side open.
    pub fn bind(
        start: Option<&str>,
        end: Option<&str>,
        unit: TimestampUnit,
    ) -> Result<Self, TimeWindowError> {
        let to_epoch = |input: Option<&str>| -> Result<Option<i64>, TimeWindowError> {
            match input.map(str::trim).filter(|s| !s.is_empty()) {
                Some(s) => Ok(Some(unit.from_datetime(parse_datetime(s)?))),
                None => Ok(None),
            }
        };

        Ok(Self {
            start: to_epoch(start)?,
            end: to_epoch(end)?,
            unit,
        })
    }

    pub fn unbounded(unit: TimestampUnit) -> Self {
        Self::new(None, None, unit)
    }

    /// `00:00:00` through `23:59:59` UTC of `day`.
    pub fn day(day: NaiveDate, unit: TimestampUnit) -> Self {
        let start = day.and_time(NaiveTime::MIN).and_utc();
        let end = start + chrono::Duration::seconds(86_399);
        Self::new(
            Some(unit.from_datetime(start)),
            Some(unit.from_datetime(end)),
            unit,
        )
    }

    pub fn start(&self) -> Option<i64> {
        self.start
    }

    pub fn end(&self) -> Option<i64> {
        self.end
    }

    pub fn unit(&self) -> TimestampUnit {
        self.unit
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn contains(&self, timestamp: i64) -> bool {
        self.start.is_none_or(|s| timestamp >= s) && self.end.is_none_or(|e| timestamp <= e)
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = |bound: Option<i64>, open: &str| match bound {
            Some(ts) => ts.to_string(),
            None => open.to_string(),
        };
        write!(
            f,
            "[{} -> {}] ({})",
            side(self.start, "-inf"),
            side(self.end, "+inf"),
            self.unit
        )
    }
}
