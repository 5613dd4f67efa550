// Bars, timeframes and symbols
pub mod market;

// Typed indicator columns and feature frames
pub mod features;

// Forecast variants and feature lists
pub mod ml;

// Backtest and cross-validation records
pub mod performance;

// Port interfaces
pub mod ports;

// Patterns and decisions
pub mod trading;

// Domain-specific error types
pub mod errors;
