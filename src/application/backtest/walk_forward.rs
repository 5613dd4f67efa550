use crate::application::indicators::{IndicatorSet, derive_features};
use crate::application::ml::cross_validation::{DEFAULT_FOLDS, cross_validate_frame};
use crate::application::ml::{AbsolutePriceForecaster, PercentChangeForecaster};
use crate::application::patterns::detect_patterns;
use crate::domain::errors::EngineError;
use crate::domain::market::{Bar, Timeframe};
use crate::domain::ml::ForecastVariant;
use crate::domain::ml::feature_registry::ABSOLUTE_PRICE_CANDIDATES;
use crate::domain::performance::{BacktestOutcome, BacktestPeriodResult};
use crate::domain::ports::MarketDataProvider;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Share of the requested bar window that must arrive for a backtest to run.
const MIN_HISTORY_RATIO: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BacktestRequest {
    pub variant: ForecastVariant,
    /// Number of walk-forward periods.
    pub lookback: usize,
    /// Bars in each verification window.
    pub horizon: usize,
}

impl BacktestRequest {
    pub fn new(variant: ForecastVariant, lookback: usize, horizon: usize) -> Self {
        Self {
            variant,
            lookback,
            horizon,
        }
    }

    pub fn timeframe(&self) -> Timeframe {
        match self.variant {
            ForecastVariant::PercentChange => Timeframe::OneHour,
            ForecastVariant::AbsolutePrice => Timeframe::OneDay,
        }
    }

    fn indicator_set(&self) -> IndicatorSet {
        match self.variant {
            ForecastVariant::PercentChange => IndicatorSet::Primary,
            ForecastVariant::AbsolutePrice => IndicatorSet::Extended,
        }
    }
}

/// Walk-forward evaluation of the forecasters on historical bars.
///
/// Every period retrains from scratch and nothing is read from or written to
/// the model cache, so identical bars always give identical reports.
pub struct WalkForwardBacktester {
    market_data: Arc<dyn MarketDataProvider>,
    base_limit: usize,
}

impl WalkForwardBacktester {
    pub fn new(market_data: Arc<dyn MarketDataProvider>, base_limit: usize) -> Self {
        Self {
            market_data,
            base_limit,
        }
    }

    /// Fetches `base_limit + lookback + horizon` bars and backtests over them.
    pub async fn run(&self, symbol: &str, request: BacktestRequest) -> Result<BacktestOutcome, EngineError> {
        if request.horizon == 0 {
            return Err(EngineError::InvalidInput("prediction horizon must be positive".to_string()));
        }
        info!("Running {} backtest for {}", request.variant, symbol);

        let limit = self.base_limit + request.lookback + request.horizon;
        let bars = self
            .market_data
            .fetch_bars(symbol, request.timeframe(), limit)
            .await
            .ok_or_else(|| EngineError::data_unavailable(symbol, "no bars returned"))?;
        if (bars.len() as f64) < limit as f64 * MIN_HISTORY_RATIO {
            return Err(EngineError::data_unavailable(
                symbol,
                format!("{} bars available, backtest needs about {}", bars.len(), limit),
            ));
        }

        let symbol_owned = symbol.to_string();
        tokio::task::spawn_blocking(move || evaluate(&symbol_owned, &bars, request))
            .await
            .map_err(|e| EngineError::ModelTraining(format!("backtest task failed: {}", e)))
    }
}

/// Backtests `request` over already-fetched `bars`.
pub fn evaluate(symbol: &str, bars: &[Bar], request: BacktestRequest) -> BacktestOutcome {
    let results: Vec<BacktestPeriodResult> = (0..request.lookback)
        .filter_map(|period| match evaluate_period(bars, period, request) {
            Ok(result) => result,
            Err(e) => {
                warn!("Backtest period {} for {} failed: {}", period, symbol, e);
                None
            }
        })
        .collect();

    let outcome = BacktestOutcome::from_results(symbol, request.variant, results);
    if let Some(report) = outcome.report() {
        info!(
            "Backtest {} ({}): {} periods, direction accuracy {:.2}%, avg error {:.2}pp",
            symbol, request.variant, report.periods_tested, report.direction_accuracy, report.avg_error_pct
        );
    }
    outcome
}

/// `Ok(None)` when the period's windows are empty.
fn evaluate_period(
    bars: &[Bar],
    period: usize,
    request: BacktestRequest,
) -> Result<Option<BacktestPeriodResult>, EngineError> {
    let Some(train_end) = bars.len().checked_sub(request.horizon + period) else {
        return Ok(None);
    };
    let train = &bars[..train_end];
    let verify = &bars[train_end..(train_end + request.horizon).min(bars.len())];
    let (Some(realized), false) = (verify.last(), train.is_empty()) else {
        return Ok(None);
    };

    let frame = derive_features(train, request.indicator_set())?;
    let Some(last_close) = frame.last_close() else {
        debug!("Period {}: no complete indicator rows", period);
        return Ok(None);
    };

    let forecast = match request.variant {
        ForecastVariant::PercentChange => PercentChangeForecaster::new().forecast(&frame, None)?,
        ForecastVariant::AbsolutePrice => AbsolutePriceForecaster::new().forecast(&frame, request.horizon, None)?,
    };
    let Some(forecast_mean) = forecast.mean() else {
        return Ok(None);
    };

    let mut result = BacktestPeriodResult::evaluate(period, last_close, forecast_mean, realized.close);
    if request.variant == ForecastVariant::AbsolutePrice {
        let patterns = detect_patterns(verify);
        result.pattern_detected = Some(patterns.any_detected());
        result.patterns = Some(patterns);
        result.direction_accuracy =
            cross_validate_frame(&frame, &frame.available(ABSOLUTE_PRICE_CANDIDATES), DEFAULT_FOLDS)
                .ok()
                .map(|summary| summary.avg_scores.direction_accuracy);
    }
    Ok(Some(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::mock::{MockMarketDataProvider, synthetic_bars};

    #[test]
    fn test_request_timeframes() {
        assert_eq!(
            BacktestRequest::new(ForecastVariant::PercentChange, 3, 5).timeframe(),
            Timeframe::OneHour
        );
        assert_eq!(
            BacktestRequest::new(ForecastVariant::AbsolutePrice, 3, 5).timeframe(),
            Timeframe::OneDay
        );
    }

    #[test]
    fn test_too_short_history_fails_structurally() {
        let bars = synthetic_bars(8, 100.0, 0.001, 7);
        let outcome = evaluate("BTC/USDT", &bars, BacktestRequest::new(ForecastVariant::PercentChange, 3, 5));
        assert!(!outcome.is_success());
    }

    #[test]
    fn test_oversized_periods_are_skipped() {
        let bars = synthetic_bars(12, 100.0, 0.001, 7);
        let request = BacktestRequest::new(ForecastVariant::PercentChange, 40, 5);
        assert!(evaluate_period(&bars, 20, request).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_run_rejects_thin_history() {
        let provider = MockMarketDataProvider::new();
        provider.insert("ETH/USDT", Timeframe::OneHour, synthetic_bars(100, 50.0, 0.0, 3));
        let backtester = WalkForwardBacktester::new(Arc::new(provider), 500);

        let err = backtester
            .run("ETH/USDT", BacktestRequest::new(ForecastVariant::PercentChange, 2, 5))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::DataUnavailable { .. }));
    }
}
