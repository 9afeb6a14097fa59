//! Per-exchange table-name validation rules.
//!
//! Some exchanges emit auxiliary tables whose names pass the coarse
//! `exchange_*_timeframe` filter but are not markets (`gate_game.com_usdt_1m`).
//! Those exchanges get a strict structural rule; every other exchange keeps
//! the coarse filter. Rules are data, loaded from a table rather than
//! branched on in the catalog.

use crate::domain::market::market_key::INSTRUMENT_SEPARATOR;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

static COARSE: ValidationPolicy = ValidationPolicy::Coarse;

/// Quote assets accepted by the built-in strict rule.
pub const STRICT_QUOTES: &[&str] = &["usdt", "usdc", "usd", "eur"];

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "lowercase")]
pub enum ValidationPolicy {
    /// Pattern match only.
    #[default]
    Coarse,
    /// `exchange_<[a-z0-9]+>_<quote>[:<quote>]_<timeframe>` with `quote` in `quotes`.
    Strict { quotes: Vec<String> },
}

impl ValidationPolicy {
    pub fn strict<I, S>(quotes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ValidationPolicy::Strict {
            quotes: quotes.into_iter().map(|q| q.into().to_lowercase()).collect(),
        }
    }

    pub fn accepts(&self, identifier: &str, exchange: &str, timeframe: &str) -> bool {
        match self {
            ValidationPolicy::Coarse => true,
            ValidationPolicy::Strict { quotes } => {
                strict_shape(identifier, exchange, timeframe, quotes)
            }
        }
    }
}

fn strict_shape(identifier: &str, exchange: &str, timeframe: &str, quotes: &[String]) -> bool {
    let Some(body) = identifier
        .strip_prefix(exchange)
        .and_then(|rest| rest.strip_prefix('_'))
        .and_then(|rest| rest.strip_suffix(timeframe))
        .and_then(|rest| rest.strip_suffix('_'))
    else {
        return false;
    };

    let (pair, settle) = match body.split_once(INSTRUMENT_SEPARATOR) {
        Some((pair, settle)) => (pair, Some(settle)),
        None => (body, None),
    };

    let Some((token, quote)) = pair.split_once('_') else {
        return false;
    };

    !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        && quotes.iter().any(|q| q == quote)
        && settle.is_none_or(|s| s == quote)
}

/// Exchange → rule table. Exchanges without an entry use `Coarse`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationPolicies {
    #[serde(default)]
    exchanges: BTreeMap<String, ValidationPolicy>,
}

impl ValidationPolicies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in table: Gate is strict, everyone else coarse.
    pub fn standard() -> Self {
        Self::new().with_policy("gate", ValidationPolicy::strict(STRICT_QUOTES.iter().copied()))
    }

    pub fn with_policy(mut self, exchange: &str, policy: ValidationPolicy) -> Self {
        self.exchanges.insert(exchange.to_lowercase(), policy);
        self
    }

    pub fn policy_for(&self, exchange: &str) -> &ValidationPolicy {
        self.exchanges
            .get(&exchange.to_lowercase())
            .unwrap_or(&COARSE)
    }

    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    /// Parses a TOML table such as
    ///
    /// ```toml
    /// [exchanges.gate]
    /// rule = "strict"
    /// quotes = ["usdt", "usdc", "usd", "eur"]
    /// ```
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let parsed: ValidationPolicies =
            toml::from_str(content).context("Failed to parse validation policy TOML")?;
        Ok(parsed
            .exchanges
            .into_iter()
            .fold(Self::new(), |acc, (exchange, policy)| {
                let policy = match policy {
                    ValidationPolicy::Strict { quotes } => ValidationPolicy::strict(quotes),
                    coarse => coarse,
                };
                acc.with_policy(&exchange, policy)
            }))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read validation policies: {}", path.display()))?;
        Self::from_toml_str(&content)
    }
}
