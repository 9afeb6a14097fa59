pub mod export;
pub mod persistence;
pub mod repositories;

pub use persistence::{Database, SqliteCandleStore, SqliteStoreConnector};
pub use repositories::{InMemoryCandleStore, InMemoryConnector};
