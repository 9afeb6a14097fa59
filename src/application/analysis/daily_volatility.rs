use crate::application::analysis::open_reference;
use crate::application::catalog::TableCatalog;
use crate::application::market_data::{CandleAggregator, CandleMetric, load_series};
use crate::config::AnalysisConfig;
use crate::domain::market::{Candle, TimeWindow, TimestampUnit};
use crate::domain::ports::StoreConnector;
use crate::domain::statistics::median;
use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Median `range%` across all markets on one UTC day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyMedianRow {
    pub day: NaiveDate,
    pub n_candles: usize,
    pub median_range_pct: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyVolatilityReport {
    pub rows: Vec<DailyMedianRow>,
    /// Median of the target day, when it has data
    pub target_median: Option<f64>,
}

/// Day-by-day median candle range over the reference exchange's full history.
pub struct DailyVolatilityProfile {
    connector: Arc<dyn StoreConnector>,
    catalog: TableCatalog,
    exchange: String,
    target_day: NaiveDate,
    unit: TimestampUnit,
}

impl DailyVolatilityProfile {
    pub fn new(
        connector: Arc<dyn StoreConnector>,
        catalog: TableCatalog,
        exchange: impl Into<String>,
        target_day: NaiveDate,
        unit: TimestampUnit,
    ) -> Self {
        Self {
            connector,
            catalog,
            exchange: exchange.into(),
            target_day,
            unit,
        }
    }

    pub fn from_config(connector: Arc<dyn StoreConnector>, config: &AnalysisConfig) -> Self {
        Self::new(
            connector,
            config.daily_catalog(),
            config.market.reference_exchange.clone(),
            config.window.target_day,
            config.unit(),
        )
    }

    pub async fn run(&self) -> Result<DailyVolatilityReport> {
        let store = open_reference(self.connector.as_ref(), &self.exchange).await?;
        let listing = self.catalog.discover(store.as_ref(), &self.exchange).await?;
        info!(
            "Volatility profile: {} spot markets on {}",
            listing.spot.len(),
            self.exchange
        );

        let window = TimeWindow::unbounded(self.unit);
        let mut candles: Vec<Candle> = Vec::new();
        for entry in &listing.spot {
            let series = load_series(store.as_ref(), entry, &window).await;
            candles.extend_from_slice(series.candles());
        }

        let report = self.profile(&candles);
        match report.target_median {
            Some(value) => info!("{} median volatility = {:.2}%", self.target_day, value),
            None => warn!("No candles on {}", self.target_day),
        }
        Ok(report)
    }

    /// Rows ascending by day.
    pub fn profile(&self, candles: &[Candle]) -> DailyVolatilityReport {
        let rows: Vec<DailyMedianRow> =
            CandleAggregator::daily_values(candles, CandleMetric::Range, self.unit)
                .into_iter()
                .filter_map(|(day, values)| {
                    Some(DailyMedianRow {
                        day,
                        n_candles: values.len(),
                        median_range_pct: median(&values)?,
                    })
                })
                .collect();

        let target_median = rows
            .iter()
            .find(|row| row.day == self.target_day)
            .map(|row| row.median_range_pct);

        DailyVolatilityReport {
            rows,
            target_median,
        }
    }
}
