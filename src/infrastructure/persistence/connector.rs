use crate::domain::errors::StoreError;
use crate::domain::ports::{CandleStore, StoreConnector};
use crate::infrastructure::persistence::database::{Database, database_url};
use crate::infrastructure::persistence::schema::CandleColumns;
use crate::infrastructure::persistence::sqlite_store::SqliteCandleStore;
use async_trait::async_trait;
use std::sync::Arc;

/// Opens `<template with {exchange}>` as a read-only SQLite store.
pub struct SqliteStoreConnector {
    url_template: String,
    max_connections: u32,
    columns: CandleColumns,
}

impl SqliteStoreConnector {
    pub fn new(url_template: impl Into<String>, max_connections: u32, columns: CandleColumns) -> Self {
        Self {
            url_template: url_template.into(),
            max_connections,
            columns,
        }
    }
}

#[async_trait]
impl StoreConnector for SqliteStoreConnector {
    async fn connect(&self, exchange: &str) -> Result<Arc<dyn CandleStore>, StoreError> {
        let url = database_url(&self.url_template, exchange);
        let database = Database::connect(&url, self.max_connections)
            .await
            .map_err(|e| StoreError::Connection {
                exchange: exchange.to_string(),
                reason: format!("{:#}", e),
            })?;

        Ok(Arc::new(SqliteCandleStore::new(
            database,
            self.columns.clone(),
        )))
    }
}
