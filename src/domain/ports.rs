use crate::domain::errors::StoreError;
use crate::domain::market::{CandleRow, TableIdentifier, TimeWindow};
use async_trait::async_trait;
use std::sync::Arc;

/// Read-only access to one exchange's candle tables.
#[async_trait]
pub trait CandleStore: Send + Sync {
    /// Stored table names matching a case-sensitive glob (`*` and `?` wildcards).
    async fn list_tables(&self, pattern: &str) -> Result<Vec<String>, StoreError>;

    /// Rows of `table` whose timestamp lies inside `window`, ascending by timestamp.
    ///
    /// A table that does not exist yields `StoreError::MissingTable`.
    async fn fetch_rows(
        &self,
        table: &TableIdentifier,
        window: &TimeWindow,
    ) -> Result<Vec<CandleRow>, StoreError>;
}

/// Opens a store per exchange. Each call owns an independent connection.
#[async_trait]
pub trait StoreConnector: Send + Sync {
    async fn connect(&self, exchange: &str) -> Result<Arc<dyn CandleStore>, StoreError>;
}
