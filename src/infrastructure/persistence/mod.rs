pub mod connector;
pub mod database;
pub mod schema;
pub mod sqlite_store;

pub use connector::SqliteStoreConnector;
pub use database::{Database, database_url};
pub use schema::CandleColumns;
pub use sqlite_store::SqliteCandleStore;
