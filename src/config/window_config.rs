//! Event window configuration parsing from environment variables.

use crate::domain::errors::TimeWindowError;
use crate::domain::market::{TimeWindow, TimestampUnit};
use anyhow::{Context, Result};
use chrono::NaiveDate;

pub const DEFAULT_WINDOW_START: &str = "2025-10-10 21:09:00";
pub const DEFAULT_WINDOW_END: &str = "2025-10-10 22:00:00";
pub const DEFAULT_TARGET_DAY: &str = "2025-10-10";

/// Event window environment configuration
#[derive(Debug, Clone, PartialEq)]
pub struct WindowEnvConfig {
    /// Human-readable bounds; `None` leaves that side open.
    pub start: Option<String>,
    pub end: Option<String>,
    /// UTC day compared against its own history
    pub target_day: NaiveDate,
}

impl Default for WindowEnvConfig {
    fn default() -> Self {
        Self {
            start: Some(DEFAULT_WINDOW_START.to_string()),
            end: Some(DEFAULT_WINDOW_END.to_string()),
            target_day: parse_day(DEFAULT_TARGET_DAY).unwrap_or_default(),
        }
    }
}

impl WindowEnvConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// An empty `WINDOW_START` / `WINDOW_END` opens that side of the window.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let bound = |key: &str, default: Option<String>| match var(key) {
            Some(raw) if raw.trim().is_empty() => None,
            Some(raw) => Some(raw.trim().to_string()),
            None => default,
        };

        let target_day = match var("TARGET_DAY") {
            Some(raw) => parse_day(&raw).context("Failed to parse TARGET_DAY")?,
            None => defaults.target_day,
        };

        let config = Self {
            start: bound("WINDOW_START", defaults.start),
            end: bound("WINDOW_END", defaults.end),
            target_day,
        };

        // Bounds must parse before any store is opened.
        config
            .event_window(TimestampUnit::Milliseconds)
            .context("Invalid WINDOW_START / WINDOW_END")?;

        Ok(config)
    }

    pub fn event_window(&self, unit: TimestampUnit) -> Result<TimeWindow, TimeWindowError> {
        TimeWindow::bind(self.start.as_deref(), self.end.as_deref(), unit)
    }

    pub fn target_window(&self, unit: TimestampUnit) -> TimeWindow {
        TimeWindow::day(self.target_day, unit)
    }
}

pub fn parse_day(raw: &str) -> Result<NaiveDate, TimeWindowError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        TimeWindowError::InvalidDateTime {
            input: raw.to_string(),
        }
    })
}
