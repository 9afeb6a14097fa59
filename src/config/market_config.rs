//! Market universe configuration parsing from environment variables.
//!
//! Which exchanges are surveyed, which one serves as the reference, which
//! quote assets count as USD and how stored tables are named and validated.

use crate::application::catalog::ValidationPolicies;
use crate::domain::market::Timeframe;
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::Path;
use std::str::FromStr;

pub const DEFAULT_EXCHANGES: &[&str] = &[
    "binance", "bitfinex", "bitget", "bitmart", "bitso", "bitstamp", "bitvavo", "bybit",
    "coinbase", "cryptocom", "gemini", "kraken", "kucoin", "okx", "probit",
];

pub const DEFAULT_USD_QUOTES: &[&str] = &["usd", "usdt", "usdc", "eur"];

/// Market universe environment configuration
#[derive(Debug, Clone)]
pub struct MarketEnvConfig {
    pub exchanges: Vec<String>,
    pub reference_exchange: String,
    pub usd_quotes: BTreeSet<String>,
    /// Table suffix for event-window analyses
    pub window_timeframe: Timeframe,
    /// Table suffix for day-level analyses
    pub daily_timeframe: Timeframe,
    pub validation_policies: ValidationPolicies,
    /// Exchanges processed at once by multi-exchange analyses
    pub concurrency: usize,
}

impl Default for MarketEnvConfig {
    fn default() -> Self {
        Self {
            exchanges: DEFAULT_EXCHANGES.iter().map(|s| s.to_string()).collect(),
            reference_exchange: "binance".to_string(),
            usd_quotes: DEFAULT_USD_QUOTES.iter().map(|s| s.to_string()).collect(),
            window_timeframe: Timeframe::OneMin,
            daily_timeframe: Timeframe::OneDay,
            validation_policies: ValidationPolicies::standard(),
            concurrency: 1,
        }
    }
}

impl MarketEnvConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let exchanges = match var("EXCHANGES") {
            Some(raw) => parse_list(&raw).into_iter().collect(),
            None => defaults.exchanges,
        };

        let usd_quotes = match var("USD_QUOTES") {
            Some(raw) => parse_list(&raw).into_iter().collect(),
            None => defaults.usd_quotes,
        };

        let timeframe = |key: &str, default: Timeframe| -> Result<Timeframe> {
            match var(key) {
                Some(raw) => Timeframe::from_str(&raw).with_context(|| format!("Failed to parse {}", key)),
                None => Ok(default),
            }
        };

        let validation_policies = match var("VALIDATION_POLICIES_FILE") {
            Some(path) => ValidationPolicies::load(Path::new(&path))
                .context("Failed to load VALIDATION_POLICIES_FILE")?,
            None => defaults.validation_policies,
        };

        let concurrency = match var("EXCHANGE_CONCURRENCY") {
            Some(raw) => raw
                .parse::<usize>()
                .context("Failed to parse EXCHANGE_CONCURRENCY")?
                .max(1),
            None => defaults.concurrency,
        };

        Ok(Self {
            exchanges,
            reference_exchange: var("REFERENCE_EXCHANGE")
                .map(|s| s.trim().to_lowercase())
                .unwrap_or(defaults.reference_exchange),
            usd_quotes,
            window_timeframe: timeframe("WINDOW_TIMEFRAME", defaults.window_timeframe)?,
            daily_timeframe: timeframe("DAILY_TIMEFRAME", defaults.daily_timeframe)?,
            validation_policies,
            concurrency,
        })
    }
}

/// Comma-separated, trimmed, lower-cased, de-duplicated, order kept.
fn parse_list(raw: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.clone()))
        .collect()
}
