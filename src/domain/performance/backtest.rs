use crate::domain::ml::ForecastVariant;
use crate::domain::trading::PatternSet;
use serde::Serialize;

/// One train/predict/verify window of a walk-forward backtest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestPeriodResult {
    pub period: usize,
    pub forecast_change_pct: f64,
    pub real_change_pct: f64,
    pub correct_direction: bool,
    /// |forecast - realized| in percentage points.
    pub error_margin_pct: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern_detected: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patterns: Option<PatternSet>,
    /// Cross-validated directional accuracy on the period's training window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction_accuracy: Option<f64>,
}

impl BacktestPeriodResult {
    /// Compares the forecast mean against the realized close at the end of the
    /// verification window, both relative to the last training close.
    pub fn evaluate(period: usize, last_train_close: f64, forecast_mean: f64, realized_close: f64) -> Self {
        let forecast_change = (forecast_mean - last_train_close) / last_train_close;
        let real_change = (realized_close - last_train_close) / last_train_close;
        let correct_direction =
            (forecast_change > 0.0 && real_change > 0.0) || (forecast_change < 0.0 && real_change < 0.0);

        Self {
            period,
            forecast_change_pct: forecast_change * 100.0,
            real_change_pct: real_change * 100.0,
            correct_direction,
            error_margin_pct: (forecast_change - real_change).abs() * 100.0,
            pattern_detected: None,
            patterns: None,
            direction_accuracy: None,
        }
    }
}

/// Aggregate of all periods that produced a result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestReport {
    pub symbol: String,
    pub variant: ForecastVariant,
    pub success: bool,
    pub direction_accuracy: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern_accuracy: Option<f64>,
    pub avg_error_pct: f64,
    pub periods_tested: usize,
    pub detailed_results: Vec<BacktestPeriodResult>,
}

impl BacktestReport {
    /// Returns `None` when no period produced a result.
    pub fn aggregate(
        symbol: &str,
        variant: ForecastVariant,
        results: Vec<BacktestPeriodResult>,
    ) -> Option<Self> {
        if results.is_empty() {
            return None;
        }
        let n = results.len() as f64;
        let correct = results.iter().filter(|r| r.correct_direction).count();
        let avg_error = results.iter().map(|r| r.error_margin_pct).sum::<f64>() / n;

        let pattern_accuracy = match variant {
            ForecastVariant::AbsolutePrice => {
                let flagged: Vec<_> = results
                    .iter()
                    .filter(|r| r.pattern_detected == Some(true))
                    .collect();
                let hits = flagged.iter().filter(|r| r.correct_direction).count();
                Some(hits as f64 / flagged.len().max(1) as f64 * 100.0)
            }
            ForecastVariant::PercentChange => None,
        };

        Some(Self {
            symbol: symbol.to_string(),
            variant,
            success: true,
            direction_accuracy: correct as f64 / n * 100.0,
            pattern_accuracy,
            avg_error_pct: avg_error,
            periods_tested: results.len(),
            detailed_results: results,
        })
    }
}

/// Result of a backtest request. A run in which no period produced a result
/// is a structured failure, not an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BacktestOutcome {
    Completed(BacktestReport),
    Failed {
        symbol: String,
        success: bool,
        error: String,
    },
}

impl BacktestOutcome {
    pub fn from_results(symbol: &str, variant: ForecastVariant, results: Vec<BacktestPeriodResult>) -> Self {
        match BacktestReport::aggregate(symbol, variant, results) {
            Some(report) => BacktestOutcome::Completed(report),
            None => BacktestOutcome::Failed {
                symbol: symbol.to_string(),
                success: false,
                error: "no valid backtest period".to_string(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, BacktestOutcome::Completed(_))
    }

    pub fn report(&self) -> Option<&BacktestReport> {
        match self {
            BacktestOutcome::Completed(report) => Some(report),
            BacktestOutcome::Failed { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_direction_and_error() {
        let r = BacktestPeriodResult::evaluate(0, 100.0, 102.0, 105.0);
        assert!(r.correct_direction);
        assert!((r.forecast_change_pct - 2.0).abs() < 1e-9);
        assert!((r.real_change_pct - 5.0).abs() < 1e-9);
        assert!((r.error_margin_pct - 3.0).abs() < 1e-9);

        let flat = BacktestPeriodResult::evaluate(1, 100.0, 100.0, 105.0);
        assert!(!flat.correct_direction);
    }

    #[test]
    fn test_aggregate_empty_is_none() {
        assert!(BacktestReport::aggregate("BTC/USDT", ForecastVariant::PercentChange, vec![]).is_none());

        let outcome = BacktestOutcome::from_results("BTC/USDT", ForecastVariant::PercentChange, vec![]);
        assert!(!outcome.is_success());
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["success"], false);
    }

    #[test]
    fn test_aggregate_metrics() {
        let mut a = BacktestPeriodResult::evaluate(0, 100.0, 101.0, 102.0);
        a.pattern_detected = Some(true);
        let mut b = BacktestPeriodResult::evaluate(1, 100.0, 99.0, 102.0);
        b.pattern_detected = Some(false);

        let report =
            BacktestReport::aggregate("ETH/USDT", ForecastVariant::AbsolutePrice, vec![a, b]).unwrap();
        assert_eq!(report.periods_tested, 2);
        assert!((report.direction_accuracy - 50.0).abs() < 1e-9);
        assert!((report.avg_error_pct - 2.0).abs() < 1e-9);
        assert_eq!(report.pattern_accuracy, Some(100.0));
    }
}
