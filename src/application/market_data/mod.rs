// Candle arithmetic, cross-market joins and series loading
pub mod candle_aggregator;
pub mod cross_market;
pub mod gap_detector;
pub mod series_loader;

pub use candle_aggregator::{CandleAggregator, CandleMetric, DerivedMetrics, WindowSummary};
pub use cross_market::{BasisRecord, BasisSummary, CrossMarketJoiner};
pub use gap_detector::{Gap, GapDetector};
pub use series_loader::load_series;
