//! Study workflows built on the catalog, the store port and the aggregation
//! engine. Each analysis produces typed rows ready for export.

pub mod basis_survey;
pub mod candle_inspection;
pub mod catalog_listing;
pub mod daily_volatility;
pub mod intraday_drops;
pub mod notional_volume;
pub mod volatility_baseline;

pub use basis_survey::{BasisSurvey, BasisSurveyReport};
pub use candle_inspection::{CandleInspection, GapRow, InspectedCandle, InspectionReport};
pub use catalog_listing::CatalogListing;
pub use daily_volatility::{DailyMedianRow, DailyVolatilityProfile, DailyVolatilityReport};
pub use intraday_drops::{DropRow, IntradayDropScan, rank_by_drop};
pub use notional_volume::{
    ExchangeVolume, NotionalVolumeSurvey, VolumeRow, VolumeSurveyReport, VolumeTotals,
};
pub use volatility_baseline::{BaselineRow, MetricPlan, VolatilityBaselineStudy};

use crate::domain::ports::{CandleStore, StoreConnector};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::warn;

/// Opens the exchange every other market is compared against. Failure ends the run.
pub(crate) async fn open_reference(
    connector: &dyn StoreConnector,
    exchange: &str,
) -> Result<Arc<dyn CandleStore>> {
    connector
        .connect(exchange)
        .await
        .with_context(|| format!("Reference exchange {} is unavailable", exchange))
}

/// Opens a surveyed exchange. Failure skips the exchange.
pub(crate) async fn open_exchange(
    connector: &dyn StoreConnector,
    exchange: &str,
) -> Option<Arc<dyn CandleStore>> {
    match connector.connect(exchange).await {
        Ok(store) => Some(store),
        Err(e) => {
            warn!("Skipping {}: {}", exchange, e);
            None
        }
    }
}
