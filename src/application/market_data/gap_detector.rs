use crate::domain::market::{Candle, Timeframe, TimestampUnit};
use serde::Serialize;

/// Spacing, in timeframes, above which two consecutive candles are reported as a gap.
pub const GAP_THRESHOLD: f64 = 1.5;

/// Missing stretch between two consecutive candles
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Gap {
    /// Timestamp of the candle before the gap
    pub start: i64,
    /// Timestamp of the candle after the gap
    pub end: i64,
    /// Spacing expressed in timeframes
    pub multiple: f64,
}

/// Finds holes in a candle series.
///
/// Consecutive candles further apart than `GAP_THRESHOLD` timeframes are
/// reported; the candles themselves are never filled or interpolated.
pub struct GapDetector {
    step: i64,
}

impl GapDetector {
    pub fn new(timeframe: Timeframe, unit: TimestampUnit) -> Self {
        Self {
            step: timeframe.to_ticks(unit),
        }
    }

    /// `candles` must be ascending by timestamp.
    pub fn detect(&self, candles: &[Candle]) -> Vec<Gap> {
        candles
            .windows(2)
            .filter_map(|pair| {
                let spacing = pair[1].timestamp - pair[0].timestamp;
                let multiple = spacing as f64 / self.step as f64;
                (multiple > GAP_THRESHOLD).then_some(Gap {
                    start: pair[0].timestamp,
                    end: pair[1].timestamp,
                    multiple,
                })
            })
            .collect()
    }
}
