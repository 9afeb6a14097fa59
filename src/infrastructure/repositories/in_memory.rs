//! In-memory candle stores.
//!
//! Thread-safe `CandleStore` / `StoreConnector` implementations backed by
//! `Arc<RwLock>` maps. Used by tests and fixtures; table-name matching follows
//! the same case-sensitive glob rules as the SQLite catalog query.

use crate::domain::errors::StoreError;
use crate::domain::market::{CandleRow, TableIdentifier, TimeWindow};
use crate::domain::ports::{CandleStore, StoreConnector};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

/// One exchange's tables held in memory
#[derive(Default)]
pub struct InMemoryCandleStore {
    tables: Arc<RwLock<BTreeMap<String, Vec<CandleRow>>>>,
}

impl InMemoryCandleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_table(&self, name: &str, rows: Vec<CandleRow>) {
        self.tables.write().await.insert(name.to_string(), rows);
    }

    /// Convenience for fully-populated `(timestamp, open, high, low, close, volume)` rows.
    pub async fn insert_candles(&self, name: &str, candles: &[(i64, f64, f64, f64, f64, f64)]) {
        let rows = candles
            .iter()
            .map(|&(timestamp, open, high, low, close, volume)| CandleRow {
                timestamp,
                open: Some(open),
                high: Some(high),
                low: Some(low),
                close: Some(close),
                volume: Some(volume),
            })
            .collect();
        self.insert_table(name, rows).await;
    }
}

#[async_trait]
impl CandleStore for InMemoryCandleStore {
    async fn list_tables(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .keys()
            .filter(|name| glob_match(pattern, name))
            .cloned()
            .collect())
    }

    async fn fetch_rows(
        &self,
        table: &TableIdentifier,
        window: &TimeWindow,
    ) -> Result<Vec<CandleRow>, StoreError> {
        let tables = self.tables.read().await;
        let rows = tables
            .get(table.as_str())
            .ok_or_else(|| StoreError::MissingTable {
                table: table.to_string(),
            })?;

        let mut selected: Vec<CandleRow> = rows
            .iter()
            .filter(|row| window.contains(row.timestamp))
            .copied()
            .collect();
        selected.sort_by_key(|row| row.timestamp);
        Ok(selected)
    }
}

/// Hands out pre-registered stores by lower-cased exchange name. Unknown
/// exchanges fail like an unreachable database.
#[derive(Default)]
pub struct InMemoryConnector {
    stores: HashMap<String, Arc<InMemoryCandleStore>>,
}

impl InMemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(mut self, exchange: &str, store: InMemoryCandleStore) -> Self {
        self.stores.insert(exchange.to_lowercase(), Arc::new(store));
        self
    }
}

#[async_trait]
impl StoreConnector for InMemoryConnector {
    async fn connect(&self, exchange: &str) -> Result<Arc<dyn CandleStore>, StoreError> {
        match self.stores.get(&exchange.to_lowercase()) {
            Some(store) => Ok(store.clone() as Arc<dyn CandleStore>),
            None => Err(StoreError::Connection {
                exchange: exchange.to_string(),
                reason: "no such database".to_string(),
            }),
        }
    }
}

/// Case-sensitive glob with `*` (any run) and `?` (any one character).
pub fn glob_match(pattern: &str, name: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let name: Vec<char> = name.chars().collect();

    let (mut p, mut n) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while n < name.len() {
        match pattern.get(p) {
            Some('*') => {
                backtrack = Some((p, n));
                p += 1;
            }
            Some(&c) if c == '?' || c == name[n] => {
                p += 1;
                n += 1;
            }
            _ => match backtrack {
                Some((star, matched)) => {
                    p = star + 1;
                    n = matched + 1;
                    backtrack = Some((star, matched + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|c| *c == '*')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::TimestampUnit;

    #[test]
    fn test_glob_match() {
        assert!(glob_match("okx_*_1m", "okx_btc_usdt_1m"));
        assert!(glob_match("okx_*_1m", "okx_btc_usdt:usdt_1m"));
        assert!(!glob_match("okx_*_1m", "OKX_btc_usdt_1m"));
        assert!(!glob_match("okx_*_1m", "okx_btc_usdt_1d"));
        assert!(!glob_match("okx_*_1m", "okx_1m"));
        assert!(glob_match("okx_?tc_*", "okx_btc_usdt_1m"));
        assert!(glob_match("*", ""));
    }

    #[tokio::test]
    async fn test_fetch_rows_window_and_order() {
        let store = InMemoryCandleStore::new();
        store
            .insert_candles(
                "okx_btc_usdt_1m",
                &[(3, 1.0, 1.0, 1.0, 1.0, 1.0), (1, 1.0, 1.0, 1.0, 1.0, 1.0), (2, 1.0, 1.0, 1.0, 1.0, 1.0)],
            )
            .await;

        let table = TableIdentifier::new("okx_btc_usdt_1m").unwrap();
        let window = TimeWindow::new(Some(2), None, TimestampUnit::Seconds);
        let rows = store.fetch_rows(&table, &window).await.unwrap();
        assert_eq!(rows.iter().map(|r| r.timestamp).collect::<Vec<_>>(), vec![2, 3]);
    }

    #[tokio::test]
    async fn test_missing_table_and_unknown_exchange() {
        let connector = InMemoryConnector::new().with_store("OKX", InMemoryCandleStore::new());
        let store = connector.connect("okx").await.ok().unwrap();

        let table = TableIdentifier::new("okx_btc_usdt_1m").unwrap();
        let err = store
            .fetch_rows(&table, &TimeWindow::unbounded(TimestampUnit::Seconds))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::MissingTable { .. }));

        assert!(matches!(
            connector.connect("kraken").await.err(),
            Some(StoreError::Connection { .. })
        ));
    }
}
