use crate::application::market_data::candle_aggregator::CandleAggregator;
use crate::domain::market::{Candle, MarketSeries};
use crate::domain::statistics::median;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Percentage spread of one comparand candle against the reference candle
/// sharing its timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BasisRecord {
    pub timestamp: i64,
    pub exchange: String,
    pub market: String,
    pub base: String,
    pub quote: String,
    pub basis_mid_pct: f64,
    pub basis_high_pct: f64,
    pub basis_low_pct: f64,
}

/// Median basis across every market of an exchange at one timestamp
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BasisSummary {
    pub exchange: String,
    pub timestamp: i64,
    pub n_markets: usize,
    pub basis_mid_pct: f64,
    pub basis_high_pct: f64,
    pub basis_low_pct: f64,
}

pub struct CrossMarketJoiner;

impl CrossMarketJoiner {
    /// Inner join on exact timestamp.
    ///
    /// Comparand candles with no reference partner are dropped, as are rows
    /// whose reference mid, high or low is not positive. When the reference
    /// repeats a timestamp the later candle wins.
    pub fn basis(reference: &MarketSeries, comparand: &MarketSeries) -> Vec<BasisRecord> {
        let index: HashMap<i64, &Candle> = reference
            .candles()
            .iter()
            .map(|c| (c.timestamp, c))
            .collect();

        comparand
            .candles()
            .iter()
            .filter_map(|comp| {
                let reference = index.get(&comp.timestamp)?;
                let ref_mid = CandleAggregator::derive(reference).mid;
                if ref_mid <= 0.0 || reference.high <= 0.0 || reference.low <= 0.0 {
                    return None;
                }
                let comp_mid = CandleAggregator::derive(comp).mid;
                let spread = |c: f64, r: f64| (c - r) / r * 100.0;

                Some(BasisRecord {
                    timestamp: comp.timestamp,
                    exchange: comparand.key.exchange.clone(),
                    market: comparand.key.market.clone(),
                    base: comparand.key.base.clone(),
                    quote: comparand.key.quote.clone(),
                    basis_mid_pct: spread(comp_mid, ref_mid),
                    basis_high_pct: spread(comp.high, reference.high),
                    basis_low_pct: spread(comp.low, reference.low),
                })
            })
            .collect()
    }

    /// Per `(exchange, timestamp)` median of each basis column, ordered by
    /// exchange then timestamp.
    pub fn median_by_exchange(records: &[BasisRecord]) -> Vec<BasisSummary> {
        let mut groups: BTreeMap<(&str, i64), Vec<&BasisRecord>> = BTreeMap::new();
        for record in records {
            groups
                .entry((record.exchange.as_str(), record.timestamp))
                .or_default()
                .push(record);
        }

        groups
            .into_iter()
            .filter_map(|((exchange, timestamp), group)| {
                let column = |pick: fn(&BasisRecord) -> f64| {
                    median(&group.iter().map(|r| pick(r)).collect::<Vec<_>>())
                };
                Some(BasisSummary {
                    exchange: exchange.to_string(),
                    timestamp,
                    n_markets: group.len(),
                    basis_mid_pct: column(|r| r.basis_mid_pct)?,
                    basis_high_pct: column(|r| r.basis_high_pct)?,
                    basis_low_pct: column(|r| r.basis_low_pct)?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::{MarketKey, TableIdentifier};

    fn series(name: &str, candles: Vec<Candle>) -> MarketSeries {
        MarketSeries::new(
            MarketKey::parse(name).unwrap(),
            TableIdentifier::new(name).unwrap(),
            candles,
        )
    }

    #[test]
    fn test_basis_inner_join() {
        let reference = series(
            "binance_btc_usdt_1m",
            vec![
                Candle::new(1, 100.0, 100.0, 100.0, 100.0, 1.0),
                Candle::new(2, 100.0, 100.0, 100.0, 100.0, 1.0),
                Candle::new(3, 100.0, 100.0, 100.0, 100.0, 1.0),
            ],
        );
        let comparand = series(
            "okx_btc_usdt:usdt_1m",
            vec![
                Candle::new(2, 100.0, 100.0, 100.0, 100.0, 1.0),
                Candle::new(3, 105.0, 105.0, 105.0, 105.0, 1.0),
                Candle::new(4, 95.0, 95.0, 95.0, 95.0, 1.0),
            ],
        );

        let records = CrossMarketJoiner::basis(&reference, &comparand);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].timestamp, 2);
        assert_eq!(records[0].basis_mid_pct, 0.0);
        assert!((records[1].basis_mid_pct - 5.0).abs() < 1e-12);
        assert!((records[1].basis_high_pct - 5.0).abs() < 1e-12);
        assert_eq!(records[1].exchange, "okx");
        assert_eq!(records[1].market, "btc_usdt:usdt");
    }

    #[test]
    fn test_basis_wider_range_keeps_mid() {
        let reference = series(
            "binance_btc_usdt_1m",
            vec![Candle::new(0, 100.0, 100.0, 100.0, 100.0, 1.0)],
        );
        let comparand = series(
            "okx_btc_usdt:usdt_1m",
            vec![Candle::new(0, 100.0, 105.0, 95.0, 100.0, 1.0)],
        );

        let records = CrossMarketJoiner::basis(&reference, &comparand);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].basis_mid_pct, 0.0);
        assert_eq!(records[0].basis_high_pct, 5.0);
        assert_eq!(records[0].basis_low_pct, -5.0);
    }

    #[test]
    fn test_basis_below_reference() {
        let reference = series(
            "binance_btc_usdt_1m",
            vec![Candle::new(3, 100.0, 100.0, 100.0, 100.0, 1.0)],
        );
        let comparand = series(
            "okx_btc_usdt:usdt_1m",
            vec![Candle::new(3, 95.0, 95.0, 95.0, 95.0, 1.0)],
        );

        let records = CrossMarketJoiner::basis(&reference, &comparand);
        assert!((records[0].basis_mid_pct + 5.0).abs() < 1e-12);
        assert!((records[0].basis_low_pct + 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_basis_skips_non_positive_reference() {
        let reference = series(
            "binance_btc_usdt_1m",
            vec![Candle::new(1, 0.0, 0.0, 0.0, 0.0, 1.0)],
        );
        let comparand = series(
            "okx_btc_usdt:usdt_1m",
            vec![Candle::new(1, 1.0, 1.0, 1.0, 1.0, 1.0)],
        );
        assert!(CrossMarketJoiner::basis(&reference, &comparand).is_empty());
    }

    #[test]
    fn test_median_by_exchange() {
        let record = |exchange: &str, ts: i64, mid: f64| BasisRecord {
            timestamp: ts,
            exchange: exchange.to_string(),
            market: "x_usdt:usdt".to_string(),
            base: "x".to_string(),
            quote: "usdt".to_string(),
            basis_mid_pct: mid,
            basis_high_pct: mid * 2.0,
            basis_low_pct: -mid,
        };
        let records = vec![
            record("okx", 1, 1.0),
            record("okx", 1, 3.0),
            record("okx", 1, 10.0),
            record("bybit", 1, -2.0),
            record("okx", 2, 4.0),
        ];

        let summary = CrossMarketJoiner::median_by_exchange(&records);
        assert_eq!(summary.len(), 3);
        assert_eq!(summary[0].exchange, "bybit");
        assert_eq!(summary[1].exchange, "okx");
        assert_eq!(summary[1].timestamp, 1);
        assert_eq!(summary[1].n_markets, 3);
        assert_eq!(summary[1].basis_mid_pct, 3.0);
        assert_eq!(summary[1].basis_high_pct, 6.0);
        assert_eq!(summary[1].basis_low_pct, -3.0);
    }
}
