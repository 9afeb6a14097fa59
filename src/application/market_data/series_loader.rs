use crate::application::catalog::CatalogEntry;
use crate::domain::errors::StoreError;
use crate::domain::market::{MarketSeries, TimeWindow};
use crate::domain::ports::CandleStore;
use tracing::{debug, warn};

/// Reads one catalog entry over `window`.
///
/// A missing table or a failed query yields an empty series; the run carries on.
pub async fn load_series(
    store: &dyn CandleStore,
    entry: &CatalogEntry,
    window: &TimeWindow,
) -> MarketSeries {
    match store.fetch_rows(&entry.table, window).await {
        Ok(rows) => {
            let series = MarketSeries::from_rows(entry.key.clone(), entry.table.clone(), rows);
            debug!("Loaded {} candles from {} {}", series.len(), entry.table, window);
            series
        }
        Err(StoreError::MissingTable { table }) => {
            debug!("Table {} not found, treating as empty", table);
            MarketSeries::empty(entry.key.clone(), entry.table.clone())
        }
        Err(e) => {
            warn!("Failed to read {}: {}", entry.table, e);
            MarketSeries::empty(entry.key.clone(), entry.table.clone())
        }
    }
}
