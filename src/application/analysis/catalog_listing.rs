use crate::application::catalog::{CatalogRow, InstrumentFilter, TableCatalog};
use crate::domain::ports::StoreConnector;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

/// Classified markets of one exchange, as export rows.
pub struct CatalogListing {
    connector: Arc<dyn StoreConnector>,
    catalog: TableCatalog,
}

impl CatalogListing {
    pub fn new(connector: Arc<dyn StoreConnector>, catalog: TableCatalog) -> Self {
        Self { connector, catalog }
    }

    pub async fn run(&self, exchange: &str, filter: InstrumentFilter) -> Result<Vec<CatalogRow>> {
        let store = self
            .connector
            .connect(exchange)
            .await
            .with_context(|| format!("Cannot open {} store", exchange))?;
        let listing = self.catalog.discover(store.as_ref(), exchange).await?;

        let rows: Vec<CatalogRow> = listing
            .entries()
            .filter(|entry| filter.admits(entry.key.instrument_type))
            .map(CatalogRow::from)
            .collect();

        info!(
            "Catalog: {} lists {} spot and {} derivative markets ({} shown)",
            exchange,
            listing.spot.len(),
            listing.derivatives.len(),
            rows.len()
        );
        Ok(rows)
    }
}
