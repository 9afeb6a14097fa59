pub mod candle;
pub mod market_key;
pub mod table_identifier;
pub mod time_window;
pub mod timeframe;

pub use candle::{Candle, CandleRow, MarketSeries};
pub use market_key::{InstrumentType, MarketKey};
pub use table_identifier::{ColumnName, TableIdentifier};
pub use time_window::{TimeWindow, TimestampUnit};
pub use timeframe::Timeframe;
