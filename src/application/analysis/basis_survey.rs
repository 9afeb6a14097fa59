use crate::application::analysis::{open_exchange, open_reference};
use crate::application::catalog::{CatalogEntry, TableCatalog};
use crate::application::market_data::{
    BasisRecord, BasisSummary, CrossMarketJoiner, load_series,
};
use crate::config::AnalysisConfig;
use crate::domain::market::{MarketSeries, TableIdentifier, TimeWindow};
use crate::domain::ports::{CandleStore, StoreConnector};
use anyhow::Result;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BasisSurveyReport {
    /// One record per matched derivative candle
    pub records: Vec<BasisRecord>,
    /// Median basis per exchange and timestamp
    pub summary: Vec<BasisSummary>,
    /// Derivative markets matched against a reference spot market, per exchange
    pub matched: Vec<(String, usize)>,
}

/// Compares every exchange's USD-quoted derivatives against the reference
/// exchange's spot market with the same base and quote.
///
/// Exchanges are processed one after another; reference series are read once
/// and reused for every derivative that matches them.
pub struct BasisSurvey {
    connector: Arc<dyn StoreConnector>,
    catalog: TableCatalog,
    reference_exchange: String,
    exchanges: Vec<String>,
    usd_quotes: BTreeSet<String>,
    window: TimeWindow,
}

impl BasisSurvey {
    pub fn new(
        connector: Arc<dyn StoreConnector>,
        catalog: TableCatalog,
        reference_exchange: impl Into<String>,
        exchanges: Vec<String>,
        usd_quotes: BTreeSet<String>,
        window: TimeWindow,
    ) -> Self {
        Self {
            connector,
            catalog,
            reference_exchange: reference_exchange.into(),
            exchanges,
            usd_quotes,
            window,
        }
    }

    pub fn from_config(connector: Arc<dyn StoreConnector>, config: &AnalysisConfig) -> Result<Self> {
        Ok(Self::new(
            connector,
            config.window_catalog(),
            config.market.reference_exchange.clone(),
            config.market.exchanges.clone(),
            config.market.usd_quotes.clone(),
            config.event_window()?,
        ))
    }

    pub async fn run(&self) -> Result<BasisSurveyReport> {
        let reference = open_reference(self.connector.as_ref(), &self.reference_exchange).await?;
        let listing = self
            .catalog
            .discover(reference.as_ref(), &self.reference_exchange)
            .await?;

        let index: HashMap<(String, String), CatalogEntry> = listing
            .spot
            .into_iter()
            .filter(|entry| entry.quote_in(&self.usd_quotes))
            .map(|entry| (entry.key.pair(), entry))
            .collect();
        info!(
            "Basis survey: {} reference spot markets on {}",
            index.len(),
            self.reference_exchange
        );

        let mut cache: HashMap<TableIdentifier, MarketSeries> = HashMap::new();
        let mut report = BasisSurveyReport::default();

        for exchange in &self.exchanges {
            let store = if exchange.eq_ignore_ascii_case(&self.reference_exchange) {
                reference.clone()
            } else {
                match open_exchange(self.connector.as_ref(), exchange).await {
                    Some(store) => store,
                    None => continue,
                }
            };

            let derivatives = match self.catalog.discover(store.as_ref(), exchange).await {
                Ok(listing) => listing.derivatives,
                Err(e) => {
                    warn!("Basis survey: catalog of {} unavailable: {}", exchange, e);
                    continue;
                }
            };
            if derivatives.is_empty() {
                debug!("Basis survey: {} has no derivative tables", exchange);
                continue;
            }

            let mut matched = 0;
            for entry in derivatives.iter().filter(|e| e.quote_in(&self.usd_quotes)) {
                let Some(spot) = index.get(&entry.key.pair()) else {
                    continue;
                };

                let records = self
                    .compare(reference.as_ref(), spot, store.as_ref(), entry, &mut cache)
                    .await;
                if !records.is_empty() {
                    matched += 1;
                    report.records.extend(records);
                }
            }

            info!(
                "Basis survey: matched {} {} derivative markets against reference spot",
                matched, exchange
            );
            report.matched.push((exchange.clone(), matched));
        }

        report.summary = CrossMarketJoiner::median_by_exchange(&report.records);
        Ok(report)
    }

    async fn compare(
        &self,
        reference: &dyn CandleStore,
        spot: &CatalogEntry,
        store: &dyn CandleStore,
        derivative: &CatalogEntry,
        cache: &mut HashMap<TableIdentifier, MarketSeries>,
    ) -> Vec<BasisRecord> {
        if !cache.contains_key(&spot.table) {
            let series = load_series(reference, spot, &self.window).await;
            cache.insert(spot.table.clone(), series);
        }
        let Some(spot_series) = cache.get(&spot.table) else {
            return Vec::new();
        };
        if spot_series.is_empty() {
            return Vec::new();
        }

        let derivative_series = load_series(store, derivative, &self.window).await;
        CrossMarketJoiner::basis(spot_series, &derivative_series)
    }
}
