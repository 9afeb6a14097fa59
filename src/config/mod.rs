//! Configuration module for crashscope.
//!
//! This module provides structured configuration loading from environment variables,
//! organized by concern: Store, Market universe, and Event window.

mod market_config;
mod store_config;
mod window_config;

pub use market_config::{DEFAULT_EXCHANGES, DEFAULT_USD_QUOTES, MarketEnvConfig};
pub use store_config::{DEFAULT_DATABASE_URL_TEMPLATE, StoreEnvConfig};
pub use window_config::{WindowEnvConfig, parse_day};

use crate::application::catalog::TableCatalog;
use crate::domain::market::{TimeWindow, TimestampUnit};
use crate::infrastructure::persistence::SqliteStoreConnector;
use anyhow::{Context, Result};

/// Settings shared by every analysis of a run.
///
/// Built once, then passed by reference to each component.
#[derive(Debug, Clone, Default)]
pub struct AnalysisConfig {
    pub store: StoreEnvConfig,
    pub market: MarketEnvConfig,
    pub window: WindowEnvConfig,
}

impl AnalysisConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let store = StoreEnvConfig::from_env().context("Failed to load store config")?;
        let market = MarketEnvConfig::from_env().context("Failed to load market config")?;
        let window = WindowEnvConfig::from_env().context("Failed to load window config")?;

        Ok(Self {
            store,
            market,
            window,
        })
    }

    pub fn unit(&self) -> TimestampUnit {
        self.store.timestamp_unit
    }

    /// Configured event window, bound to the store's timestamp unit.
    pub fn event_window(&self) -> Result<TimeWindow> {
        self.window
            .event_window(self.unit())
            .context("Invalid event window")
    }

    /// Whole target day, bound to the store's timestamp unit.
    pub fn target_window(&self) -> TimeWindow {
        self.window.target_window(self.unit())
    }

    /// Catalog over event-window tables (e.g. `_1m`).
    pub fn window_catalog(&self) -> TableCatalog {
        TableCatalog::new(
            self.market.validation_policies.clone(),
            self.market.window_timeframe.as_str(),
        )
    }

    /// Catalog over day-level tables (e.g. `_1d`).
    pub fn daily_catalog(&self) -> TableCatalog {
        TableCatalog::new(
            self.market.validation_policies.clone(),
            self.market.daily_timeframe.as_str(),
        )
    }

    pub fn connector(&self) -> SqliteStoreConnector {
        SqliteStoreConnector::new(
            self.store.url_template.clone(),
            self.store.max_connections,
            self.store.columns.clone(),
        )
    }
}
