//! Candle store configuration parsing from environment variables.

use crate::domain::market::TimestampUnit;
use crate::infrastructure::persistence::CandleColumns;
use anyhow::{Context, Result};

pub const DEFAULT_DATABASE_URL_TEMPLATE: &str = "sqlite://data/{exchange}.db";

/// Candle store environment configuration
#[derive(Debug, Clone)]
pub struct StoreEnvConfig {
    /// `{exchange}` is replaced with the lower-cased exchange name.
    pub url_template: String,
    pub timestamp_unit: TimestampUnit,
    pub columns: CandleColumns,
    pub max_connections: u32,
}

impl Default for StoreEnvConfig {
    fn default() -> Self {
        Self {
            url_template: DEFAULT_DATABASE_URL_TEMPLATE.to_string(),
            timestamp_unit: TimestampUnit::Milliseconds,
            columns: CandleColumns::default(),
            max_connections: 4,
        }
    }
}

impl StoreEnvConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let timestamp_unit = match var("TIMESTAMP_UNIT") {
            Some(raw) => raw
                .parse::<TimestampUnit>()
                .context("Failed to parse TIMESTAMP_UNIT")?,
            None => defaults.timestamp_unit,
        };

        let column = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());
        let columns = CandleColumns::new(
            &column("COLUMN_TIMESTAMP", defaults.columns.timestamp.as_str()),
            &column("COLUMN_OPEN", defaults.columns.open.as_str()),
            &column("COLUMN_HIGH", defaults.columns.high.as_str()),
            &column("COLUMN_LOW", defaults.columns.low.as_str()),
            &column("COLUMN_CLOSE", defaults.columns.close.as_str()),
            &column("COLUMN_VOLUME", defaults.columns.volume.as_str()),
        )
        .context("Invalid COLUMN_* setting")?;

        let max_connections = match var("DB_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse::<u32>()
                .context("Failed to parse DB_MAX_CONNECTIONS")?,
            None => defaults.max_connections,
        };

        Ok(Self {
            url_template: var("DATABASE_URL_TEMPLATE").unwrap_or(defaults.url_template),
            timestamp_unit,
            columns,
            max_connections,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_store_config_defaults() {
        let config = StoreEnvConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.url_template, "sqlite://data/{exchange}.db");
        assert_eq!(config.timestamp_unit, TimestampUnit::Milliseconds);
        assert_eq!(config.columns, CandleColumns::default());
    }

    #[test]
    fn test_store_config_overrides() {
        let config = StoreEnvConfig::from_lookup(lookup(&[
            ("TIMESTAMP_UNIT", "s"),
            ("COLUMN_TIMESTAMP", "ts"),
            ("DATABASE_URL_TEMPLATE", "sqlite:///srv/{exchange}.sqlite"),
        ]))
        .unwrap();
        assert_eq!(config.timestamp_unit, TimestampUnit::Seconds);
        assert_eq!(config.columns.timestamp.as_str(), "ts");
        assert_eq!(config.url_template, "sqlite:///srv/{exchange}.sqlite");
    }

    #[test]
    fn test_store_config_rejects_bad_values() {
        assert!(StoreEnvConfig::from_lookup(lookup(&[("TIMESTAMP_UNIT", "ns")])).is_err());
        assert!(StoreEnvConfig::from_lookup(lookup(&[("COLUMN_HIGH", "high price")])).is_err());
    }
}
