use crate::application::market_data::{CandleAggregator, Gap, GapDetector};
use crate::domain::errors::StoreError;
use crate::domain::market::{Candle, MarketKey, TableIdentifier, Timeframe, TimeWindow, TimestampUnit};
use crate::domain::ports::StoreConnector;
use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// One stored candle with its derived quantities
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InspectedCandle {
    pub timestamp: i64,
    pub time_utc: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub mid: f64,
    pub notional_volume: f64,
    pub drop_pct: Option<f64>,
    pub pump_pct: Option<f64>,
    pub range_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GapRow {
    pub start: i64,
    pub end: i64,
    pub start_utc: String,
    pub end_utc: String,
    pub multiple: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InspectionReport {
    pub candles: Vec<InspectedCandle>,
    pub gaps: Vec<GapRow>,
}

/// Reads one table over an optionally open window and reports its candles
/// and any holes in the series.
pub struct CandleInspection {
    connector: Arc<dyn StoreConnector>,
    table: TableIdentifier,
    exchange: String,
    timeframe: Timeframe,
    window: TimeWindow,
}

impl CandleInspection {
    /// The exchange and timeframe are read from the table name.
    pub fn new(
        connector: Arc<dyn StoreConnector>,
        table: TableIdentifier,
        window: TimeWindow,
    ) -> Result<Self> {
        let key = MarketKey::parse(table.as_str())
            .with_context(|| format!("Cannot inspect {}", table))?;
        let timeframe: Timeframe = key
            .timeframe
            .parse()
            .with_context(|| format!("Unknown timeframe in {}", table))?;

        Ok(Self {
            connector,
            table,
            exchange: key.exchange,
            timeframe,
            window,
        })
    }

    pub async fn run(&self) -> Result<InspectionReport> {
        let store = self
            .connector
            .connect(&self.exchange)
            .await
            .with_context(|| format!("Cannot open {} store", self.exchange))?;

        let rows = match store.fetch_rows(&self.table, &self.window).await {
            Ok(rows) => rows,
            Err(StoreError::MissingTable { table }) => {
                warn!("Table {} not found", table);
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };

        let candles: Vec<Candle> = rows.iter().filter_map(Candle::from_row).collect();
        let report = inspect(&candles, self.timeframe, self.window.unit());
        info!(
            "Inspected {}: {} candles, {} gaps over {}",
            self.table,
            report.candles.len(),
            report.gaps.len(),
            self.window
        );
        Ok(report)
    }
}

/// Derived rows and gaps for `candles`, which must be ascending by timestamp.
pub fn inspect(candles: &[Candle], timeframe: Timeframe, unit: TimestampUnit) -> InspectionReport {
    let time_utc = |ts: i64| {
        unit.to_datetime(ts)
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default()
    };

    let rows = candles
        .iter()
        .map(|candle| {
            let metrics = CandleAggregator::derive(candle);
            InspectedCandle {
                timestamp: candle.timestamp,
                time_utc: time_utc(candle.timestamp),
                open: candle.open,
                high: candle.high,
                low: candle.low,
                close: candle.close,
                volume: candle.volume,
                mid: metrics.mid,
                notional_volume: metrics.notional_volume,
                drop_pct: metrics.drop_pct,
                pump_pct: metrics.pump_pct,
                range_pct: metrics.range_pct,
            }
        })
        .collect();

    let gaps = GapDetector::new(timeframe, unit)
        .detect(candles)
        .into_iter()
        .map(|Gap { start, end, multiple }| GapRow {
            start,
            end,
            start_utc: time_utc(start),
            end_utc: time_utc(end),
            multiple,
        })
        .collect();

    InspectionReport {
        candles: rows,
        gaps,
    }
}
