use crate::domain::errors::DegenerateStatistic;
use serde::Serialize;
use statrs::statistics::{Data, Distribution, OrderStatistics};
use std::fmt;

/// How the historical sample is trimmed before mean/std are taken
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum TrimPolicy {
    /// Full history, unmodified.
    None,
    /// Drop values outside `[P(tail), P(1 - tail)]`.
    Percentile(f64),
}

impl TrimPolicy {
    /// Symmetric 0.1% tail trim.
    pub const TAIL_0_1: TrimPolicy = TrimPolicy::Percentile(0.001);

    pub fn label(&self) -> String {
        match self {
            TrimPolicy::None => "none".to_string(),
            TrimPolicy::Percentile(tail) => {
                let lower = round6(tail * 100.0);
                format!("trim{}%-{}%", lower, round6(100.0 - lower))
            }
        }
    }

    /// Values retained by this policy, in input order.
    pub fn apply(&self, values: &[f64]) -> Vec<f64> {
        match self {
            TrimPolicy::None => values.to_vec(),
            TrimPolicy::Percentile(tail) => {
                let mut sorted = values.to_vec();
                sorted.sort_by(f64::total_cmp);
                let (Some(lower), Some(upper)) =
                    (quantile(&sorted, *tail), quantile(&sorted, 1.0 - tail))
                else {
                    return Vec::new();
                };
                values
                    .iter()
                    .copied()
                    .filter(|v| *v >= lower && *v <= upper)
                    .collect()
            }
        }
    }
}

impl fmt::Display for TrimPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

fn round6(v: f64) -> f64 {
    (v * 1e6).round() / 1e6
}

/// How far a target observation sits from its own history
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Baseline {
    pub metric: String,
    pub trim: TrimPolicy,
    pub history_len: usize,
    pub kept_len: usize,
    pub mean: f64,
    pub std: f64,
    pub target_value: f64,
    pub zscore: f64,
}

/// Shared baseline utilities.
pub struct BaselineStatistics;

impl BaselineStatistics {
    /// Mean and sample standard deviation of `history` after `trim`, and the
    /// z-score of `target_value` against them.
    ///
    /// Non-finite history values are ignored.
    pub fn baseline(
        metric: &str,
        history: &[f64],
        target_value: f64,
        trim: TrimPolicy,
    ) -> Result<Baseline, DegenerateStatistic> {
        let finite: Vec<f64> = history.iter().copied().filter(|v| v.is_finite()).collect();
        let kept = trim.apply(&finite);

        if !target_value.is_finite() {
            return Err(DegenerateStatistic::MissingTarget {
                metric: metric.to_string(),
            });
        }

        let Some((mean, std)) = Self::mean_std(&kept) else {
            return Err(DegenerateStatistic::InsufficientHistory {
                metric: metric.to_string(),
                len: kept.len(),
            });
        };

        if std == 0.0 {
            return Err(DegenerateStatistic::ZeroDeviation {
                metric: metric.to_string(),
                mean,
            });
        }

        Ok(Baseline {
            metric: metric.to_string(),
            trim,
            history_len: finite.len(),
            kept_len: kept.len(),
            mean,
            std,
            target_value,
            zscore: (target_value - mean) / std,
        })
    }

    /// Mean and sample (n-1) standard deviation; `None` below two values.
    pub fn mean_std(values: &[f64]) -> Option<(f64, f64)> {
        if values.len() < 2 {
            return None;
        }
        let data = Data::new(values.to_vec());
        let mean = data.mean()?;
        let std_dev = data.std_dev()?;
        (mean.is_finite() && std_dev.is_finite()).then_some((mean, std_dev))
    }
}

/// Median of `values`; the two middle values are averaged for even lengths.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(OrderStatistics::median(&mut Data::new(values.to_vec())))
}

/// `q`-quantile of an ascending slice, linearly interpolated between the
/// closest ranks (type 7). statrs' `OrderStatistics::quantile` uses the
/// median-unbiased estimator (type 8) and gives different trim bounds.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let rank = q * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_untrimmed() {
        let baseline =
            BaselineStatistics::baseline("drop%", &[1.0, 2.0, 3.0, 4.0, 5.0], 10.0, TrimPolicy::None)
                .unwrap();

        assert!((baseline.mean - 3.0).abs() < 1e-12);
        assert!((baseline.std - 1.5811388).abs() < 1e-6);
        assert!((baseline.zscore - 4.4271887).abs() < 1e-6);
        assert_eq!(baseline.history_len, 5);
        assert_eq!(baseline.kept_len, 5);
    }

    #[test]
    fn test_zero_deviation_is_undefined() {
        let err = BaselineStatistics::baseline("drop%", &[2.0, 2.0, 2.0], 5.0, TrimPolicy::None)
            .unwrap_err();
        assert!(matches!(err, DegenerateStatistic::ZeroDeviation { .. }));
    }

    #[test]
    fn test_empty_history_is_undefined() {
        let err = BaselineStatistics::baseline("pump%", &[], 5.0, TrimPolicy::TAIL_0_1).unwrap_err();
        assert!(matches!(
            err,
            DegenerateStatistic::InsufficientHistory { len: 0, .. }
        ));
    }

    #[test]
    fn test_missing_target_is_undefined() {
        let err = BaselineStatistics::baseline("range%", &[1.0, 2.0], f64::NAN, TrimPolicy::None)
            .unwrap_err();
        assert!(matches!(err, DegenerateStatistic::MissingTarget { .. }));
    }

    #[test]
    fn test_trim_keeps_bulk_of_uniform_sample() {
        let values: Vec<f64> = (0..=100_000).map(|i| i as f64).collect();
        let kept = TrimPolicy::TAIL_0_1.apply(&values);

        let share = kept.len() as f64 / values.len() as f64;
        assert!(share >= 0.998, "kept share {}", share);
        assert!(kept.len() < values.len());
        assert!(kept[0] >= 99.0 && kept[0] <= 101.0);
        assert!(kept[kept.len() - 1] >= 99_899.0);
    }

    #[test]
    fn test_trim_discards_extreme_outlier() {
        let mut values: Vec<f64> = (1..=2000).map(|i| (i % 10) as f64).collect();
        values.push(1_000_000.0);

        let trimmed = BaselineStatistics::baseline("pump%", &values, 5.0, TrimPolicy::TAIL_0_1).unwrap();
        let untrimmed = BaselineStatistics::baseline("pump%", &values, 5.0, TrimPolicy::None).unwrap();

        assert!(trimmed.mean < 10.0);
        assert!(untrimmed.mean > 400.0);
        assert!(trimmed.kept_len < trimmed.history_len);
    }

    #[test]
    fn test_trim_label() {
        assert_eq!(TrimPolicy::None.label(), "none");
        assert_eq!(TrimPolicy::TAIL_0_1.label(), "trim0.1%-99.9%");
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[]), None);
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
    }

    #[test]
    fn test_quantile_interpolates() {
        let sorted = [0.0, 10.0];
        assert_eq!(quantile(&sorted, 0.25), Some(2.5));
        assert_eq!(quantile(&sorted, 1.0), Some(10.0));
        assert_eq!(quantile(&sorted, 1.5), None);
    }
}
