// Offline evaluation records
pub mod backtest;
pub mod metrics;

pub use backtest::{BacktestOutcome, BacktestPeriodResult, BacktestReport};
pub use metrics::{CrossValidationSummary, FoldMetrics, MetricScores};
