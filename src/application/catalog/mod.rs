//! Discovery and classification of stored market tables.
//!
//! The catalog asks the store for every table matching
//! `<exchange>_*_<timeframe>`, drops malformed names, applies the exchange's
//! validation policy and splits the survivors into spot and derivative
//! markets.

pub mod policy;

pub use policy::{ValidationPolicies, ValidationPolicy};

use crate::domain::errors::StoreError;
use crate::domain::market::{InstrumentType, MarketKey, TableIdentifier};
use crate::domain::ports::CandleStore;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

/// Which instrument classes a listing should contain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InstrumentFilter {
    #[default]
    All,
    Spot,
    Derivative,
}

impl InstrumentFilter {
    pub fn admits(&self, instrument_type: InstrumentType) -> bool {
        match self {
            InstrumentFilter::All => true,
            InstrumentFilter::Spot => instrument_type == InstrumentType::Spot,
            InstrumentFilter::Derivative => instrument_type == InstrumentType::Derivative,
        }
    }
}

/// A catalog-approved table and the market it stores
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub table: TableIdentifier,
    pub key: MarketKey,
}

impl CatalogEntry {
    pub fn quote_in(&self, quotes: &BTreeSet<String>) -> bool {
        quotes.contains(&self.key.quote)
    }
}

/// Markets of one exchange, split by instrument class
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketListing {
    pub spot: Vec<CatalogEntry>,
    pub derivatives: Vec<CatalogEntry>,
}

impl MarketListing {
    pub fn len(&self) -> usize {
        self.spot.len() + self.derivatives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spot.is_empty() && self.derivatives.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.spot.iter().chain(self.derivatives.iter())
    }
}

/// Flat row for catalog exports
#[derive(Debug, Clone, Serialize)]
pub struct CatalogRow {
    pub table: String,
    pub exchange: String,
    pub instrument_type: InstrumentType,
    pub base: String,
    pub quote: String,
    pub settle: Option<String>,
    pub timeframe: String,
}

impl From<&CatalogEntry> for CatalogRow {
    fn from(entry: &CatalogEntry) -> Self {
        Self {
            table: entry.table.to_string(),
            exchange: entry.key.exchange.clone(),
            instrument_type: entry.key.instrument_type,
            base: entry.key.base.clone(),
            quote: entry.key.quote.clone(),
            settle: entry.key.settle.clone(),
            timeframe: entry.key.timeframe.clone(),
        }
    }
}

pub struct TableCatalog {
    policies: ValidationPolicies,
    timeframe: String,
}

impl TableCatalog {
    pub fn new(policies: ValidationPolicies, timeframe: impl Into<String>) -> Self {
        Self {
            policies,
            timeframe: timeframe.into(),
        }
    }

    pub fn timeframe(&self) -> &str {
        &self.timeframe
    }

    /// Glob used against stored names. Exchange names are lower-cased first.
    pub fn pattern_for(&self, exchange: &str) -> String {
        format!("{}_*_{}", exchange.to_lowercase(), self.timeframe)
    }

    /// Catalog-approved identifiers for `exchange`, in store order.
    pub async fn list_markets(
        &self,
        store: &dyn CandleStore,
        exchange: &str,
        filter: InstrumentFilter,
    ) -> Result<Vec<TableIdentifier>, StoreError> {
        let names = store.list_tables(&self.pattern_for(exchange)).await?;
        Ok(self.filter_names(exchange, names, filter))
    }

    /// Applies the identifier, policy and instrument filters to raw names.
    pub fn filter_names(
        &self,
        exchange: &str,
        names: impl IntoIterator<Item = String>,
        filter: InstrumentFilter,
    ) -> Vec<TableIdentifier> {
        let exchange = exchange.to_lowercase();
        let policy = self.policies.policy_for(&exchange);

        names
            .into_iter()
            .filter_map(|name| match TableIdentifier::new(name) {
                Ok(table) => Some(table),
                Err(e) => {
                    debug!("Catalog: excluding malformed table name ({})", e);
                    None
                }
            })
            .filter(|table| policy.accepts(table.as_str(), &exchange, &self.timeframe))
            .filter(|table| filter.admits(InstrumentType::of(table.as_str())))
            .collect()
    }

    /// Approved tables of `exchange` with parsed keys, split into spot and derivatives.
    ///
    /// Identifiers that do not decompose into a market are skipped.
    pub async fn discover(
        &self,
        store: &dyn CandleStore,
        exchange: &str,
    ) -> Result<MarketListing, StoreError> {
        let tables = self
            .list_markets(store, exchange, InstrumentFilter::All)
            .await?;

        let mut listing = MarketListing::default();
        for table in tables {
            let key = match MarketKey::parse(table.as_str()) {
                Ok(key) => key,
                Err(e) => {
                    debug!("Catalog: skipping {} ({})", table, e);
                    continue;
                }
            };
            let entry = CatalogEntry { table, key };
            match entry.key.instrument_type {
                InstrumentType::Spot => listing.spot.push(entry),
                InstrumentType::Derivative => listing.derivatives.push(entry),
            }
        }

        debug!(
            "Catalog: {} -> {} spot, {} derivative markets",
            exchange,
            listing.spot.len(),
            listing.derivatives.len()
        );
        Ok(listing)
    }
}
