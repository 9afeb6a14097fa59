use chrono::NaiveDate;
use crashscope::application::analysis::{
    BasisSurvey, CandleInspection, DailyVolatilityProfile, IntradayDropScan, MetricPlan,
    NotionalVolumeSurvey, VolatilityBaselineStudy,
};
use crashscope::application::catalog::{TableCatalog, ValidationPolicies};
use crashscope::application::market_data::CandleMetric;
use crashscope::domain::market::{InstrumentType, TableIdentifier, TimeWindow, TimestampUnit};
use crashscope::domain::ports::StoreConnector;
use crashscope::domain::statistics::TrimPolicy;
use crashscope::infrastructure::{InMemoryCandleStore, InMemoryConnector};
use std::collections::BTreeSet;
use std::sync::Arc;

const OCT_8_S: i64 = 1_759_881_600;
const OCT_9_S: i64 = 1_759_968_000;
const OCT_10_S: i64 = 1_760_054_400;
const OCT_11_S: i64 = 1_760_140_800;
const EVENT_MS: i64 = 1_760_130_540_000;

fn oct_10() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 10, 10).unwrap()
}

fn catalog(timeframe: &str) -> TableCatalog {
    TableCatalog::new(ValidationPolicies::standard(), timeframe)
}

fn quotes(raw: &[&str]) -> BTreeSet<String> {
    raw.iter().map(|s| s.to_string()).collect()
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[tokio::test]
async fn test_drop_scan_ranks_reference_spot_markets() {
    let binance = InMemoryCandleStore::new();
    let ms = OCT_10_S * 1000;
    binance
        .insert_candles(
            "binance_eth_usdt_1d",
            &[(ms + 3_600_000, 100.0, 100.0, 95.0, 96.0, 1.0)],
        )
        .await;
    binance
        .insert_candles(
            "binance_btc_usdt_1d",
            &[(ms + 3_600_000, 100.0, 110.0, 90.0, 100.0, 1.0)],
        )
        .await;
    binance
        .insert_candles(
            "binance_flat_usdt_1d",
            &[(ms + 3_600_000, 100.0, 100.0, 100.0, 100.0, 1.0)],
        )
        .await;
    binance
        .insert_candles(
            "binance_sui_usdt:usdt_1d",
            &[(ms + 3_600_000, 100.0, 200.0, 10.0, 100.0, 1.0)],
        )
        .await;
    binance
        .insert_candles(
            "binance_old_usdt_1d",
            &[((OCT_9_S * 1000), 100.0, 200.0, 10.0, 100.0, 1.0)],
        )
        .await;

    let connector = Arc::new(InMemoryConnector::new().with_store("binance", binance));
    let scan = IntradayDropScan::new(
        connector,
        catalog("1d"),
        "binance",
        TimeWindow::day(oct_10(), TimestampUnit::Milliseconds),
    );

    let rows = scan.run().await.unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].table_name, "binance_btc_usdt_1d");
    assert!((rows[0].intraday_drop_pct - 18.1818).abs() < 1e-3);
    assert_eq!(rows[0].day_high, 110.0);
    assert_eq!(rows[1].market, "eth_usdt");
    assert!(close(rows[1].intraday_drop_pct, 5.0));

    // A flat day stays in the ranking with no drop.
    assert_eq!(rows[2].table_name, "binance_flat_usdt_1d");
    assert_eq!(rows[2].intraday_drop_pct, 0.0);
    assert_eq!(rows[2].n_candles, 1);
}

#[tokio::test]
async fn test_drop_scan_requires_reference_exchange() {
    let scan = IntradayDropScan::new(
        Arc::new(InMemoryConnector::new()),
        catalog("1d"),
        "binance",
        TimeWindow::day(oct_10(), TimestampUnit::Milliseconds),
    );
    assert!(scan.run().await.is_err());
}

#[tokio::test]
async fn test_volume_survey_totals_and_skips() {
    let binance = InMemoryCandleStore::new();
    binance
        .insert_candles(
            "binance_btc_usdt_1m",
            &[
                (EVENT_MS, 100.0, 101.0, 99.0, 100.0, 2.0),
                (EVENT_MS + 60_000, 100.0, 102.0, 98.0, 100.0, 1.0),
                // outside the window
                (EVENT_MS + 86_400_000, 100.0, 102.0, 98.0, 100.0, 1_000.0),
            ],
        )
        .await;
    binance
        .insert_candles(
            "binance_eth_btc_1m",
            &[(EVENT_MS, 1.0, 1.0, 1.0, 1.0, 1_000.0)],
        )
        .await;
    binance.insert_table("binance_empty_usdt_1m", Vec::new()).await;

    let okx = InMemoryCandleStore::new();
    okx.insert_candles(
        "okx_btc_usdt:usdt_1m",
        &[(EVENT_MS, 50.0, 51.0, 49.0, 50.0, 4.0)],
    )
    .await;

    let connector = Arc::new(
        InMemoryConnector::new()
            .with_store("binance", binance)
            .with_store("okx", okx),
    );
    let survey = NotionalVolumeSurvey::new(
        connector,
        catalog("1m"),
        vec!["binance".into(), "ghost".into(), "okx".into()],
        quotes(&["usdt"]),
        TimeWindow::new(
            Some(EVENT_MS),
            Some(EVENT_MS + 3_060_000),
            TimestampUnit::Milliseconds,
        ),
    )
    .with_concurrency(3);

    let report = survey.run().await.unwrap();
    assert_eq!(report.skipped, vec!["ghost".to_string()]);
    assert_eq!(report.rows.len(), 2);
    assert_eq!(report.rows[0].exchange, "binance");
    assert_eq!(report.rows[0].n_candles, 2);
    assert_eq!(report.rows[1].instrument_type, InstrumentType::Derivative);

    assert!(close(report.totals.spot, 300.0));
    assert!(close(report.totals.derivative, 200.0));
    assert!(close(report.totals.total(), 500.0));

    let exchanges: Vec<&str> = report.exchanges.iter().map(|e| e.exchange.as_str()).collect();
    assert_eq!(exchanges, vec!["binance", "okx"]);
    assert!(close(report.exchanges[1].total_usd_volume, 200.0));
}

async fn history_store() -> InMemoryCandleStore {
    let store = InMemoryCandleStore::new();
    store
        .insert_candles(
            "binance_btc_usdt_1d",
            &[
                (OCT_8_S, 100.0, 101.0, 99.0, 100.0, 1.0),
                (OCT_9_S, 100.0, 101.0, 98.0, 100.0, 1.0),
                (OCT_10_S, 100.0, 101.0, 92.0, 100.0, 1.0),
                (OCT_11_S, 100.0, 101.0, 50.0, 100.0, 1.0),
            ],
        )
        .await;
    store
        .insert_candles(
            "binance_eth_usdt_1d",
            &[
                (OCT_8_S, 100.0, 101.0, 97.0, 100.0, 1.0),
                (OCT_8_S + 60, 100.0, 101.0, 95.0, 100.0, 1.0),
                (OCT_9_S, 100.0, 101.0, 96.0, 100.0, 1.0),
                (OCT_10_S, 100.0, 101.0, 90.0, 100.0, 1.0),
                (OCT_10_S + 60, 100.0, 101.0, 88.0, 100.0, 1.0),
                // non-positive prices never enter the sample
                (OCT_9_S + 60, 0.0, 101.0, 0.0, 100.0, 1.0),
            ],
        )
        .await;
    store
}

#[tokio::test]
async fn test_baseline_scores_target_day_against_history() {
    let connector = Arc::new(InMemoryConnector::new().with_store("binance", history_store().await));
    let study = VolatilityBaselineStudy::new(
        connector,
        catalog("1d"),
        "binance",
        oct_10(),
        TimestampUnit::Seconds,
    )
    .with_plans(vec![MetricPlan {
        metric: CandleMetric::Drop,
        trim: TrimPolicy::None,
    }]);

    let rows = study.run().await.unwrap();
    assert_eq!(rows.len(), 1);

    let row = &rows[0];
    assert_eq!(row.metric, "drop%");
    assert_eq!(row.history_len, 5);
    assert!(close(row.mean.unwrap(), 3.0));
    assert!(close(row.target_median.unwrap(), 10.0));
    assert!((row.zscore.unwrap() - 4.4271887).abs() < 1e-6);
}

#[tokio::test]
async fn test_daily_profile_over_full_history() {
    let connector = Arc::new(InMemoryConnector::new().with_store("binance", history_store().await));
    let profile = DailyVolatilityProfile::new(
        connector,
        catalog("1d"),
        "binance",
        oct_10(),
        TimestampUnit::Seconds,
    );

    let report = profile.run().await.unwrap();
    let days: Vec<NaiveDate> = report.rows.iter().map(|r| r.day).collect();
    assert_eq!(days.len(), 4);
    assert_eq!(days[2], oct_10());

    // Oct 10 ranges: 9, 11, 13
    assert_eq!(report.rows[2].n_candles, 3);
    assert!(close(report.target_median.unwrap(), 11.0));
}

#[tokio::test]
async fn test_basis_survey_against_reference_spot() {
    let binance = InMemoryCandleStore::new();
    binance
        .insert_candles(
            "binance_btc_usdt_1m",
            &[
                (EVENT_MS, 100.0, 101.0, 99.0, 100.0, 1.0),
                (EVENT_MS + 60_000, 100.0, 101.0, 99.0, 100.0, 1.0),
                (EVENT_MS + 120_000, 100.0, 101.0, 99.0, 100.0, 1.0),
            ],
        )
        .await;

    let okx = InMemoryCandleStore::new();
    okx.insert_candles(
        "okx_btc_usdt:usdt_1m",
        &[
            (EVENT_MS, 100.0, 101.0, 99.0, 100.0, 1.0),
            (EVENT_MS + 60_000, 105.0, 106.0, 104.0, 105.0, 1.0),
            (EVENT_MS + 120_000, 95.0, 96.0, 94.0, 95.0, 1.0),
            // no reference partner
            (EVENT_MS + 180_000, 95.0, 96.0, 94.0, 95.0, 1.0),
        ],
    )
    .await;
    okx.insert_candles(
        "okx_doge_usdt:usdt_1m",
        &[(EVENT_MS, 1.0, 1.0, 1.0, 1.0, 1.0)],
    )
    .await;

    let connector = Arc::new(
        InMemoryConnector::new()
            .with_store("binance", binance)
            .with_store("okx", okx),
    );
    let survey = BasisSurvey::new(
        connector,
        catalog("1m"),
        "binance",
        vec!["okx".into(), "bybit".into()],
        quotes(&["usdt"]),
        TimeWindow::unbounded(TimestampUnit::Milliseconds),
    );

    let report = survey.run().await.unwrap();
    let mids: Vec<f64> = report.records.iter().map(|r| r.basis_mid_pct).collect();
    assert_eq!(mids.len(), 3);
    assert!(close(mids[0], 0.0));
    assert!(close(mids[1], 5.0));
    assert!(close(mids[2], -5.0));
    assert_eq!(report.records[0].exchange, "okx");

    assert_eq!(report.summary.len(), 3);
    assert_eq!(report.summary[1].n_markets, 1);
    assert!(close(report.summary[1].basis_mid_pct, 5.0));
    assert_eq!(report.matched, vec![("okx".to_string(), 1)]);
}

#[tokio::test]
async fn test_basis_survey_without_reference_fails() {
    let connector: Arc<dyn StoreConnector> =
        Arc::new(InMemoryConnector::new().with_store("okx", InMemoryCandleStore::new()));
    let survey = BasisSurvey::new(
        connector,
        catalog("1m"),
        "binance",
        vec!["okx".into()],
        quotes(&["usdt"]),
        TimeWindow::unbounded(TimestampUnit::Milliseconds),
    );
    assert!(survey.run().await.is_err());
}

#[tokio::test]
async fn test_inspection_reports_gaps() {
    let binance = InMemoryCandleStore::new();
    binance
        .insert_candles(
            "binance_render_usdt_1m",
            &[
                (EVENT_MS, 3.0, 3.1, 2.0, 2.5, 10.0),
                (EVENT_MS + 60_000, 2.5, 2.6, 2.4, 2.5, 10.0),
                (EVENT_MS + 300_000, 2.5, 2.6, 2.4, 2.5, 10.0),
                (EVENT_MS + 360_000, 2.5, 2.6, 2.4, 2.5, 10.0),
            ],
        )
        .await;
    let connector = Arc::new(InMemoryConnector::new().with_store("binance", binance));

    let inspection = CandleInspection::new(
        connector.clone(),
        TableIdentifier::new("binance_render_usdt_1m").unwrap(),
        TimeWindow::new(Some(EVENT_MS), None, TimestampUnit::Milliseconds),
    )
    .unwrap();
    let report = inspection.run().await.unwrap();

    assert_eq!(report.candles.len(), 4);
    assert!(close(report.candles[0].mid, 2.55));
    assert_eq!(report.gaps.len(), 1);
    assert_eq!(report.gaps[0].start, EVENT_MS + 60_000);
    assert!(close(report.gaps[0].multiple, 4.0));

    let missing = CandleInspection::new(
        connector,
        TableIdentifier::new("binance_nope_usdt_1m").unwrap(),
        TimeWindow::unbounded(TimestampUnit::Milliseconds),
    )
    .unwrap();
    let report = missing.run().await.unwrap();
    assert!(report.candles.is_empty());
    assert!(report.gaps.is_empty());
}
