use crate::domain::errors::IdentifierError;
use crate::domain::market::ColumnName;

/// Column names shared by every candle table of a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandleColumns {
    pub timestamp: ColumnName,
    pub open: ColumnName,
    pub high: ColumnName,
    pub low: ColumnName,
    pub close: ColumnName,
    pub volume: ColumnName,
}

impl CandleColumns {
    pub fn new(
        timestamp: &str,
        open: &str,
        high: &str,
        low: &str,
        close: &str,
        volume: &str,
    ) -> Result<Self, IdentifierError> {
        Ok(Self {
            timestamp: ColumnName::new(timestamp)?,
            open: ColumnName::new(open)?,
            high: ColumnName::new(high)?,
            low: ColumnName::new(low)?,
            close: ColumnName::new(close)?,
            volume: ColumnName::new(volume)?,
        })
    }

    /// Projection with stable aliases so rows decode by name whatever the
    /// stored column names are. Prices are read as REAL even when stored as text.
    pub fn select_list(&self) -> String {
        format!(
            "CAST({} AS INTEGER) AS ts, CAST({} AS REAL) AS open, CAST({} AS REAL) AS high, \
             CAST({} AS REAL) AS low, CAST({} AS REAL) AS close, CAST({} AS REAL) AS volume",
            self.timestamp.quoted(),
            self.open.quoted(),
            self.high.quoted(),
            self.low.quoted(),
            self.close.quoted(),
            self.volume.quoted(),
        )
    }
}

impl Default for CandleColumns {
    fn default() -> Self {
        Self {
            timestamp: ColumnName::from_static("timestamp"),
            open: ColumnName::from_static("open"),
            high: ColumnName::from_static("high"),
            low: ColumnName::from_static("low"),
            close: ColumnName::from_static("close"),
            volume: ColumnName::from_static("volume"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_unsafe_column() {
        assert!(CandleColumns::new("ts; DROP", "o", "h", "l", "c", "v").is_err());
    }

    #[test]
    fn test_select_list_aliases() {
        let columns = CandleColumns::new("time", "o", "h", "l", "c", "v").unwrap();
        let select = columns.select_list();
        assert!(select.starts_with("CAST(\"time\" AS INTEGER) AS ts"));
        assert!(select.ends_with("CAST(\"v\" AS REAL) AS volume"));
    }
}
