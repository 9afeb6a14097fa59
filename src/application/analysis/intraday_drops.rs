use crate::application::analysis::open_reference;
use crate::application::catalog::TableCatalog;
use crate::application::market_data::{CandleAggregator, load_series};
use crate::config::AnalysisConfig;
use crate::domain::market::TimeWindow;
use crate::domain::ports::StoreConnector;
use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// High-to-low swing of one spot market over the scanned window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DropRow {
    pub table_name: String,
    pub exchange: String,
    pub market: String,
    pub timeframe: String,
    pub n_candles: usize,
    pub day_high: f64,
    pub day_low: f64,
    pub intraday_drop_pct: f64,
}

/// Largest drop first. Equal drops keep their input order.
pub fn rank_by_drop(rows: &mut [DropRow]) {
    rows.sort_by(|a, b| b.intraday_drop_pct.total_cmp(&a.intraday_drop_pct));
}

/// Ranks the reference exchange's spot markets by intraday drop on one day.
pub struct IntradayDropScan {
    connector: Arc<dyn StoreConnector>,
    catalog: TableCatalog,
    exchange: String,
    window: TimeWindow,
}

impl IntradayDropScan {
    pub fn new(
        connector: Arc<dyn StoreConnector>,
        catalog: TableCatalog,
        exchange: impl Into<String>,
        window: TimeWindow,
    ) -> Self {
        Self {
            connector,
            catalog,
            exchange: exchange.into(),
            window,
        }
    }

    /// Daily tables of the reference exchange over the target day.
    pub fn from_config(connector: Arc<dyn StoreConnector>, config: &AnalysisConfig) -> Self {
        Self::new(
            connector,
            config.daily_catalog(),
            config.market.reference_exchange.clone(),
            config.target_window(),
        )
    }

    pub async fn run(&self) -> Result<Vec<DropRow>> {
        let store = open_reference(self.connector.as_ref(), &self.exchange).await?;
        let listing = self.catalog.discover(store.as_ref(), &self.exchange).await?;
        info!(
            "Drop scan: {} spot markets on {} over {}",
            listing.spot.len(),
            self.exchange,
            self.window
        );

        let mut rows = Vec::new();
        for entry in &listing.spot {
            let series = load_series(store.as_ref(), entry, &self.window).await;
            let summary = CandleAggregator::summarize(series.candles());

            let (Some(day_high), Some(day_low), Some(drop)) =
                (summary.day_high, summary.day_low, summary.intraday_drop_pct())
            else {
                debug!("Drop scan: no usable candles in {}", entry.table);
                continue;
            };

            rows.push(DropRow {
                table_name: entry.table.to_string(),
                exchange: entry.key.exchange.clone(),
                market: entry.key.market.clone(),
                timeframe: entry.key.timeframe.clone(),
                n_candles: summary.n_candles,
                day_high,
                day_low,
                intraday_drop_pct: drop,
            });
        }

        rank_by_drop(&mut rows);
        info!("Drop scan: {} markets ranked", rows.len());
        Ok(rows)
    }
}
