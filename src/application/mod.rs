// Feature derivation (technical indicators)
pub mod indicators;

// Candlestick and divergence patterns
pub mod patterns;

// Regressors, ensembles, model cache and forecast variants
pub mod ml;

// Walk-forward evaluation
pub mod backtest;

// Rule ladder, risk levels and basket allocation
pub mod decision;

// Parallel asset screening
pub mod screening;
