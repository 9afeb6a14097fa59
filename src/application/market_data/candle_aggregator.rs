use crate::domain::market::{Candle, TimestampUnit};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Per-candle quantities. A percentage whose denominator is not positive is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DerivedMetrics {
    pub mid: f64,
    pub notional_volume: f64,
    pub drop_pct: Option<f64>,
    pub pump_pct: Option<f64>,
    pub range_pct: Option<f64>,
}

/// Percentage move of a single candle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum CandleMetric {
    /// `(open - low) / open`
    Drop,
    /// `(high - low) / low`
    Pump,
    /// `(high - low) / open`
    Range,
}

impl CandleMetric {
    pub const ALL: [CandleMetric; 3] = [CandleMetric::Drop, CandleMetric::Pump, CandleMetric::Range];

    pub fn name(&self) -> &'static str {
        match self {
            CandleMetric::Drop => "drop%",
            CandleMetric::Pump => "pump%",
            CandleMetric::Range => "range%",
        }
    }

    pub fn of(&self, metrics: &DerivedMetrics) -> Option<f64> {
        match self {
            CandleMetric::Drop => metrics.drop_pct,
            CandleMetric::Pump => metrics.pump_pct,
            CandleMetric::Range => metrics.range_pct,
        }
    }
}

impl fmt::Display for CandleMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Aggregate over the candles of one market inside a window
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindowSummary {
    pub n_candles: usize,
    pub day_high: Option<f64>,
    pub day_low: Option<f64>,
    pub notional_volume: f64,
}

impl WindowSummary {
    /// `(high - low) / high * 100`. `None` for an empty window or a non-positive high.
    pub fn intraday_drop_pct(&self) -> Option<f64> {
        let (high, low) = (self.day_high?, self.day_low?);
        if high <= 0.0 {
            return None;
        }
        Some((high - low) / high * 100.0)
    }
}

/// Stateless candle arithmetic.
pub struct CandleAggregator;

impl CandleAggregator {
    pub fn derive(candle: &Candle) -> DerivedMetrics {
        let mid = (candle.high + candle.low) / 2.0;
        let pct = |num: f64, denom: f64| (denom > 0.0).then(|| num / denom * 100.0);

        DerivedMetrics {
            mid,
            notional_volume: mid * candle.volume,
            drop_pct: pct(candle.open - candle.low, candle.open),
            pump_pct: pct(candle.high - candle.low, candle.low),
            range_pct: pct(candle.high - candle.low, candle.open),
        }
    }

    pub fn summarize(candles: &[Candle]) -> WindowSummary {
        let fold_opt = |acc: Option<f64>, v: f64, pick: fn(f64, f64) -> f64| {
            Some(acc.map_or(v, |a| pick(a, v)))
        };

        candles.iter().fold(
            WindowSummary {
                n_candles: 0,
                day_high: None,
                day_low: None,
                notional_volume: 0.0,
            },
            |acc, candle| WindowSummary {
                n_candles: acc.n_candles + 1,
                day_high: fold_opt(acc.day_high, candle.high, f64::max),
                day_low: fold_opt(acc.day_low, candle.low, f64::min),
                notional_volume: acc.notional_volume + Self::derive(candle).notional_volume,
            },
        )
    }

    /// Sum of `mid * volume` over `candles`.
    pub fn notional_volume(candles: &[Candle]) -> f64 {
        candles
            .iter()
            .map(|c| Self::derive(c).notional_volume)
            .sum()
    }

    /// Values of `metric` grouped by UTC calendar day. Candles whose metric
    /// is undefined are left out.
    pub fn daily_values(
        candles: &[Candle],
        metric: CandleMetric,
        unit: TimestampUnit,
    ) -> BTreeMap<NaiveDate, Vec<f64>> {
        let mut buckets: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
        for candle in candles {
            let Some(day) = unit.day_of(candle.timestamp) else {
                continue;
            };
            if let Some(value) = metric.of(&Self::derive(candle)) {
                buckets.entry(day).or_default().push(value);
            }
        }
        buckets
    }
}
