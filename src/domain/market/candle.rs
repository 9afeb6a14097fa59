use crate::domain::market::market_key::MarketKey;
use crate::domain::market::table_identifier::TableIdentifier;
use serde::{Deserialize, Serialize};

/// A stored row as decoded at the store boundary. Any price may be NULL.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CandleRow {
    pub timestamp: i64,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
}

/// One OHLCV interval. `timestamp` is in the unit of its source table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Drops rows with any NULL price. A NULL volume reads as zero.
    pub fn from_row(row: &CandleRow) -> Option<Self> {
        Some(Self {
            timestamp: row.timestamp,
            open: row.open?,
            high: row.high?,
            low: row.low?,
            close: row.close?,
            volume: row.volume.unwrap_or(0.0),
        })
    }

    /// All four prices strictly positive.
    pub fn has_positive_prices(&self) -> bool {
        self.open > 0.0 && self.high > 0.0 && self.low > 0.0 && self.close > 0.0
    }
}

/// Candles of one market, ascending by timestamp. Gaps are allowed.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketSeries {
    pub key: MarketKey,
    pub table: TableIdentifier,
    candles: Vec<Candle>,
}

impl MarketSeries {
    pub fn new(key: MarketKey, table: TableIdentifier, mut candles: Vec<Candle>) -> Self {
        candles.sort_by_key(|c| c.timestamp);
        Self {
            key,
            table,
            candles,
        }
    }

    pub fn empty(key: MarketKey, table: TableIdentifier) -> Self {
        Self::new(key, table, Vec::new())
    }

    pub fn from_rows(
        key: MarketKey,
        table: TableIdentifier,
        rows: impl IntoIterator<Item = CandleRow>,
    ) -> Self {
        let candles = rows.into_iter().filter_map(|r| Candle::from_row(&r)).collect();
        Self::new(key, table, candles)
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }
}
