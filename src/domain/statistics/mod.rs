pub mod baseline;

pub use baseline::{Baseline, BaselineStatistics, TrimPolicy, median, quantile};
