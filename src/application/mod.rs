// Table discovery and classification
pub mod catalog;

// Candle arithmetic and cross-market joins
pub mod market_data;

// Study workflows
pub mod analysis;
