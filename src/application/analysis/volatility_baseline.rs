use crate::application::analysis::open_reference;
use crate::application::catalog::TableCatalog;
use crate::application::market_data::{CandleAggregator, CandleMetric, load_series};
use crate::config::AnalysisConfig;
use crate::domain::market::{Candle, TimeWindow, TimestampUnit};
use crate::domain::ports::StoreConnector;
use crate::domain::statistics::{BaselineStatistics, TrimPolicy, median};
use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Which metric to score and how its history is trimmed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricPlan {
    pub metric: CandleMetric,
    pub trim: TrimPolicy,
}

impl MetricPlan {
    /// `drop%` untrimmed; `pump%` and `range%` with the 0.1% tail trim.
    pub fn standard() -> Vec<MetricPlan> {
        vec![
            MetricPlan {
                metric: CandleMetric::Drop,
                trim: TrimPolicy::None,
            },
            MetricPlan {
                metric: CandleMetric::Pump,
                trim: TrimPolicy::TAIL_0_1,
            },
            MetricPlan {
                metric: CandleMetric::Range,
                trim: TrimPolicy::TAIL_0_1,
            },
        ]
    }
}

/// Baseline of one metric. Undefined statistics are left empty and the
/// reason is given in `status`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaselineRow {
    pub metric: String,
    pub trim: String,
    pub history_len: usize,
    pub kept_len: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub target_median: Option<f64>,
    pub zscore: Option<f64>,
    pub status: String,
}

/// Per-candle values split into the days before the target day and the target day itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricSample {
    pub history: Vec<f64>,
    pub target: Vec<f64>,
}

/// Scores the target day's median candle move against the whole prior history
/// of the reference exchange's spot markets.
pub struct VolatilityBaselineStudy {
    connector: Arc<dyn StoreConnector>,
    catalog: TableCatalog,
    exchange: String,
    target_day: NaiveDate,
    unit: TimestampUnit,
    plans: Vec<MetricPlan>,
}

impl VolatilityBaselineStudy {
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
            plans: MetricPlan::standard(),
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

    pub fn with_plans(mut self, plans: Vec<MetricPlan>) -> Self {
        self.plans = plans;
        self
    }

    pub async fn run(&self) -> Result<Vec<BaselineRow>> {
        let store = open_reference(self.connector.as_ref(), &self.exchange).await?;
        let listing = self.catalog.discover(store.as_ref(), &self.exchange).await?;
        info!(
            "Baseline study: scanning full history of {} spot markets on {}",
            listing.spot.len(),
            self.exchange
        );

        let window = TimeWindow::unbounded(self.unit);
        let mut candles: Vec<Candle> = Vec::new();
        for entry in &listing.spot {
            let series = load_series(store.as_ref(), entry, &window).await;
            candles.extend(series.candles().iter().filter(|c| c.has_positive_prices()));
        }
        info!("Baseline study: {} candles loaded", candles.len());

        Ok(self
            .plans
            .iter()
            .map(|plan| {
                let sample = self.sample(&candles, plan.metric);
                score(plan, &sample)
            })
            .collect())
    }

    /// History is every day strictly before the target day; later days are ignored.
    pub fn sample(&self, candles: &[Candle], metric: CandleMetric) -> MetricSample {
        let days: BTreeMap<NaiveDate, Vec<f64>> =
            CandleAggregator::daily_values(candles, metric, self.unit);

        let mut sample = MetricSample::default();
        for (day, values) in days {
            if day < self.target_day {
                sample.history.extend(values);
            } else if day == self.target_day {
                sample.target.extend(values);
            }
        }
        sample
    }
}

/// Baseline row for one metric plan.
pub fn score(plan: &MetricPlan, sample: &MetricSample) -> BaselineRow {
    let name = plan.metric.name();
    let target_median = median(&sample.target);
    let kept_len = plan.trim.apply(&sample.history).len();

    match BaselineStatistics::baseline(
        name,
        &sample.history,
        target_median.unwrap_or(f64::NAN),
        plan.trim,
    ) {
        Ok(baseline) => {
            info!(
                "{}: mean {:.4}, std {:.4}, target median {:.4}, z-score {:.2}",
                name, baseline.mean, baseline.std, baseline.target_value, baseline.zscore
            );
            BaselineRow {
                metric: name.to_string(),
                trim: plan.trim.label(),
                history_len: baseline.history_len,
                kept_len: baseline.kept_len,
                mean: Some(baseline.mean),
                std: Some(baseline.std),
                target_median: Some(baseline.target_value),
                zscore: Some(baseline.zscore),
                status: "ok".to_string(),
            }
        }
        Err(e) => {
            warn!("{}", e);
            let moments = BaselineStatistics::mean_std(&plan.trim.apply(&sample.history));
            BaselineRow {
                metric: name.to_string(),
                trim: plan.trim.label(),
                history_len: sample.history.len(),
                kept_len,
                mean: moments.map(|(mean, _)| mean),
                std: moments.map(|(_, std)| std),
                target_median,
                zscore: None,
                status: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(metric: CandleMetric, trim: TrimPolicy) -> MetricPlan {
        MetricPlan { metric, trim }
    }

    #[test]
    fn test_standard_plan() {
        let plans = MetricPlan::standard();
        assert_eq!(plans.len(), 3);
        assert_eq!(plans[0].trim, TrimPolicy::None);
        assert_eq!(plans[1].trim.label(), "trim0.1%-99.9%");
        assert_eq!(plans[2].metric, CandleMetric::Range);
    }

    #[test]
    fn test_score_defined() {
        let sample = MetricSample {
            history: vec![1.0, 2.0, 3.0, 4.0, 5.0],
            target: vec![8.0, 10.0, 12.0],
        };
        let row = score(&plan(CandleMetric::Drop, TrimPolicy::None), &sample);

        assert_eq!(row.metric, "drop%");
        assert_eq!(row.trim, "none");
        assert_eq!(row.target_median, Some(10.0));
        assert!((row.zscore.unwrap() - 4.4271887).abs() < 1e-6);
        assert_eq!(row.status, "ok");
    }

    #[test]
    fn test_score_constant_history_is_undefined() {
        let sample = MetricSample {
            history: vec![2.0; 10],
            target: vec![5.0],
        };
        let row = score(&plan(CandleMetric::Pump, TrimPolicy::None), &sample);

        assert_eq!(row.zscore, None);
        assert_eq!(row.mean, Some(2.0));
        assert_eq!(row.std, Some(0.0));
        assert!(row.status.contains("zero standard deviation"));
    }

    #[test]
    fn test_score_without_target_day() {
        let sample = MetricSample {
            history: vec![1.0, 2.0, 3.0],
            target: Vec::new(),
        };
        let row = score(&plan(CandleMetric::Range, TrimPolicy::TAIL_0_1), &sample);
        assert_eq!(row.target_median, None);
        assert_eq!(row.zscore, None);
        assert!(row.status.contains("no target observation"));
    }
}
