use crate::domain::errors::StoreError;
use crate::domain::market::{CandleRow, TableIdentifier, TimeWindow};
use crate::domain::ports::CandleStore;
use crate::infrastructure::persistence::database::Database;
use crate::infrastructure::persistence::schema::CandleColumns;
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

const CATALOG_QUERY: &str =
    "SELECT name FROM sqlite_master WHERE type = 'table' AND name GLOB ? ORDER BY name";

/// `CandleStore` over one SQLite database (one exchange).
pub struct SqliteCandleStore {
    pool: SqlitePool,
    columns: CandleColumns,
}

impl SqliteCandleStore {
    pub fn new(database: Database, columns: CandleColumns) -> Self {
        Self {
            pool: database.pool,
            columns,
        }
    }

    /// Range query text for `table`. Bounds are bound as parameters, in
    /// `start`, `end` order, only for the sides that are closed.
    pub fn range_sql(&self, table: &TableIdentifier, window: &TimeWindow) -> String {
        let ts = self.columns.timestamp.quoted();
        let predicate = match (window.start(), window.end()) {
            (Some(_), Some(_)) => format!(" WHERE {ts} >= ? AND {ts} <= ?"),
            (Some(_), None) => format!(" WHERE {ts} >= ?"),
            (None, Some(_)) => format!(" WHERE {ts} <= ?"),
            (None, None) => String::new(),
        };

        format!(
            "SELECT {} FROM {}{} ORDER BY {} ASC",
            self.columns.select_list(),
            table.quoted(),
            predicate,
            ts
        )
    }

    fn decode(row: &SqliteRow) -> Result<CandleRow, sqlx::Error> {
        Ok(CandleRow {
            timestamp: row.try_get::<i64, _>("ts")?,
            open: row.try_get("open")?,
            high: row.try_get("high")?,
            low: row.try_get("low")?,
            close: row.try_get("close")?,
            volume: row.try_get("volume")?,
        })
    }
}

fn query_error(table: &TableIdentifier, err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err
        && db_err.message().contains("no such table")
    {
        return StoreError::MissingTable {
            table: table.to_string(),
        };
    }
    StoreError::Query {
        table: table.to_string(),
        reason: err.to_string(),
    }
}

#[async_trait]
impl CandleStore for SqliteCandleStore {
    async fn list_tables(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        let rows = sqlx::query(CATALOG_QUERY)
            .bind(pattern)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Query {
                table: "sqlite_master".to_string(),
                reason: e.to_string(),
            })?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("name"))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::Query {
                table: "sqlite_master".to_string(),
                reason: e.to_string(),
            })
    }

    async fn fetch_rows(
        &self,
        table: &TableIdentifier,
        window: &TimeWindow,
    ) -> Result<Vec<CandleRow>, StoreError> {
        let sql = self.range_sql(table, window);
        debug!("{} {}", sql, window);

        let mut query = sqlx::query(&sql);
        if let Some(start) = window.start() {
            query = query.bind(start);
        }
        if let Some(end) = window.end() {
            query = query.bind(end);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| query_error(table, e))?;

        rows.iter()
            .map(Self::decode)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| query_error(table, e))
    }
}
