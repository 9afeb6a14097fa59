use crate::application::analysis::open_exchange;
use crate::application::catalog::{CatalogEntry, TableCatalog};
use crate::application::market_data::{CandleAggregator, load_series};
use crate::config::AnalysisConfig;
use crate::domain::market::{InstrumentType, TimeWindow};
use crate::domain::ports::{CandleStore, StoreConnector};
use anyhow::Result;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::BTreeSet;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::sync::Arc;
use tracing::{info, warn};

/// Notional traded in one market over the event window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeRow {
    pub exchange: String,
    pub instrument_type: InstrumentType,
    pub table: String,
    pub base: String,
    pub quote: String,
    pub n_candles: usize,
    pub usd_volume: f64,
}

/// Spot / derivative notional sums. Combining is associative, so partial
/// totals from independent exchanges can be merged in any order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct VolumeTotals {
    pub spot: f64,
    pub derivative: f64,
}

impl VolumeTotals {
    pub fn record(&mut self, instrument_type: InstrumentType, amount: f64) {
        match instrument_type {
            InstrumentType::Spot => self.spot += amount,
            InstrumentType::Derivative => self.derivative += amount,
        }
    }

    pub fn total(&self) -> f64 {
        self.spot + self.derivative
    }
}

impl Add for VolumeTotals {
    type Output = VolumeTotals;

    fn add(self, rhs: Self) -> Self::Output {
        VolumeTotals {
            spot: self.spot + rhs.spot,
            derivative: self.derivative + rhs.derivative,
        }
    }
}

impl AddAssign for VolumeTotals {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for VolumeTotals {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(VolumeTotals::default(), Add::add)
    }
}

/// Per-exchange totals row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExchangeVolume {
    pub exchange: String,
    pub n_markets: usize,
    pub spot_usd_volume: f64,
    pub derivative_usd_volume: f64,
    pub total_usd_volume: f64,
}

#[derive(Debug, Clone, Default)]
pub struct VolumeSurveyReport {
    pub rows: Vec<VolumeRow>,
    pub exchanges: Vec<ExchangeVolume>,
    pub totals: VolumeTotals,
    /// Exchanges whose store could not be opened
    pub skipped: Vec<String>,
}

struct ExchangeSurvey {
    rows: Vec<VolumeRow>,
    totals: VolumeTotals,
}

/// Sums USD-quoted notional volume across exchanges over the event window.
pub struct NotionalVolumeSurvey {
    connector: Arc<dyn StoreConnector>,
    catalog: TableCatalog,
    exchanges: Vec<String>,
    usd_quotes: BTreeSet<String>,
    window: TimeWindow,
    concurrency: usize,
}

impl NotionalVolumeSurvey {
    pub fn new(
        connector: Arc<dyn StoreConnector>,
        catalog: TableCatalog,
        exchanges: Vec<String>,
        usd_quotes: BTreeSet<String>,
        window: TimeWindow,
    ) -> Self {
        Self {
            connector,
            catalog,
            exchanges,
            usd_quotes,
            window,
            concurrency: 1,
        }
    }

    pub fn from_config(connector: Arc<dyn StoreConnector>, config: &AnalysisConfig) -> Result<Self> {
        Ok(Self::new(
            connector,
            config.window_catalog(),
            config.market.exchanges.clone(),
            config.market.usd_quotes.clone(),
            config.event_window()?,
        )
        .with_concurrency(config.market.concurrency))
    }

    /// Number of exchanges surveyed at once, each on its own connection.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub async fn run(&self) -> Result<VolumeSurveyReport> {
        info!(
            "Volume survey: {} exchanges over {} (concurrency {})",
            self.exchanges.len(),
            self.window,
            self.concurrency
        );

        let mut results: Vec<(usize, Option<ExchangeSurvey>)> =
            stream::iter(self.exchanges.iter().enumerate())
                .map(|(idx, exchange)| async move { (idx, self.survey_exchange(exchange).await) })
                .buffer_unordered(self.concurrency)
                .collect()
                .await;
        results.sort_by_key(|(idx, _)| *idx);

        let mut report = VolumeSurveyReport::default();
        for ((_, result), exchange) in results.into_iter().zip(&self.exchanges) {
            let Some(survey) = result else {
                report.skipped.push(exchange.clone());
                continue;
            };

            report.exchanges.push(ExchangeVolume {
                exchange: exchange.clone(),
                n_markets: survey.rows.len(),
                spot_usd_volume: survey.totals.spot,
                derivative_usd_volume: survey.totals.derivative,
                total_usd_volume: survey.totals.total(),
            });
            report.totals += survey.totals;
            report.rows.extend(survey.rows);
        }

        info!(
            "Volume survey: spot {:.2} USD, derivatives {:.2} USD, total {:.2} USD",
            report.totals.spot,
            report.totals.derivative,
            report.totals.total()
        );
        Ok(report)
    }

    async fn survey_exchange(&self, exchange: &str) -> Option<ExchangeSurvey> {
        let store = open_exchange(self.connector.as_ref(), exchange).await?;
        let listing = match self.catalog.discover(store.as_ref(), exchange).await {
            Ok(listing) => listing,
            Err(e) => {
                warn!("Volume survey: catalog of {} unavailable: {}", exchange, e);
                return Some(ExchangeSurvey {
                    rows: Vec::new(),
                    totals: VolumeTotals::default(),
                });
            }
        };
        info!(
            "Volume survey: {} has {} spot, {} derivative tables",
            exchange,
            listing.spot.len(),
            listing.derivatives.len()
        );

        let mut rows = Vec::new();
        let mut totals = VolumeTotals::default();
        for entry in listing.entries().filter(|e| e.quote_in(&self.usd_quotes)) {
            if let Some(row) = self.market_volume(store.as_ref(), entry).await {
                totals.record(row.instrument_type, row.usd_volume);
                rows.push(row);
            }
        }

        info!(
            "Volume survey: {} spot {:.2} USD, derivatives {:.2} USD, combined {:.2} USD",
            exchange,
            totals.spot,
            totals.derivative,
            totals.total()
        );
        Some(ExchangeSurvey { rows, totals })
    }

    async fn market_volume(&self, store: &dyn CandleStore, entry: &CatalogEntry) -> Option<VolumeRow> {
        let series = load_series(store, entry, &self.window).await;
        if series.is_empty() {
            return None;
        }

        Some(VolumeRow {
            exchange: entry.key.exchange.clone(),
            instrument_type: entry.key.instrument_type,
            table: entry.table.to_string(),
            base: entry.key.base.clone(),
            quote: entry.key.quote.clone(),
            n_candles: series.len(),
            usd_volume: CandleAggregator::notional_volume(series.candles()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totals_merge_in_any_order() {
        let a = VolumeTotals {
            spot: 1.0,
            derivative: 2.0,
        };
        let b = VolumeTotals {
            spot: 10.0,
            derivative: 0.5,
        };
        let c = VolumeTotals {
            spot: 0.25,
            derivative: 4.0,
        };

        assert_eq!((a + b) + c, a + (b + c));
        assert_eq!(a + b, b + a);
        let summed: VolumeTotals = vec![a, b, c].into_iter().sum();
        assert_eq!(summed.total(), 17.75);
    }

    #[test]
    fn test_record_by_instrument() {
        let mut totals = VolumeTotals::default();
        totals.record(InstrumentType::Spot, 5.0);
        totals.record(InstrumentType::Derivative, 7.0);
        totals.record(InstrumentType::Spot, 1.0);
        assert_eq!(totals.spot, 6.0);
        assert_eq!(totals.derivative, 7.0);
        assert_eq!(totals.total(), 13.0);
    }
}
