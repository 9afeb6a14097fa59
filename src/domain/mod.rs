// Market identity, candles and time windows
pub mod market;

// Historical baselines and z-scores
pub mod statistics;

// Port interfaces
pub mod ports;

// Domain-specific error types
pub mod errors;
