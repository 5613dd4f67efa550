//! Ordered forecasting strategies tried top-down until one succeeds.

use crate::domain::errors::EngineError;
use crate::domain::features::FeatureFrame;
use crate::domain::ml::Forecast;
use tracing::{debug, info, warn};

/// Result of a single strategy attempt.
#[derive(Debug)]
pub enum StrategyOutcome {
    Success(Forecast),
    /// Preconditions not met (no cache entry, missing columns). Not an error.
    FeatureUnavailable(String),
    TrainingFailed(EngineError),
}

impl From<Result<Forecast, EngineError>> for StrategyOutcome {
    fn from(result: Result<Forecast, EngineError>) -> Self {
        match result {
            Ok(forecast) => StrategyOutcome::Success(forecast),
            Err(e) => StrategyOutcome::TrainingFailed(e),
        }
    }
}

pub trait ForecastStrategy {
    fn name(&self) -> &'static str;
    fn attempt(&self, frame: &FeatureFrame) -> StrategyOutcome;
}

/// Runs `strategies` in order and returns the first forecast produced.
///
/// When every strategy declines or fails, the last training failure is
/// returned as `ModelTraining`.
pub fn run_strategies(
    label: &str,
    frame: &FeatureFrame,
    strategies: &[&dyn ForecastStrategy],
) -> Result<Forecast, EngineError> {
    let mut last_failure: Option<EngineError> = None;

    for strategy in strategies {
        match strategy.attempt(frame) {
            StrategyOutcome::Success(forecast) => {
                if last_failure.is_some() {
                    info!("{}: {} strategy recovered the forecast", label, strategy.name());
                }
                return Ok(forecast);
            }
            StrategyOutcome::FeatureUnavailable(reason) => {
                debug!("{}: {} strategy skipped: {}", label, strategy.name(), reason);
            }
            StrategyOutcome::TrainingFailed(e) => {
                warn!("{}: {} strategy failed: {}", label, strategy.name(), e);
                last_failure = Some(e);
            }
        }
    }

    Err(match last_failure {
        Some(EngineError::ModelTraining(msg)) => EngineError::ModelTraining(msg),
        Some(other) => EngineError::ModelTraining(other.to_string()),
        None => EngineError::ModelTraining(format!("{}: no strategy could produce a forecast", label)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ml::{ForecastSource, ForecastVariant};

    struct Fixed(&'static str, fn() -> StrategyOutcome);

    impl ForecastStrategy for Fixed {
        fn name(&self) -> &'static str {
            self.0
        }
        fn attempt(&self, _frame: &FeatureFrame) -> StrategyOutcome {
            (self.1)()
        }
    }

    fn flat() -> StrategyOutcome {
        StrategyOutcome::Success(Forecast {
            variant: ForecastVariant::AbsolutePrice,
            source: ForecastSource::Flat,
            prices: vec![1.0],
        })
    }

    fn skip() -> StrategyOutcome {
        StrategyOutcome::FeatureUnavailable("no cache".to_string())
    }

    fn fail() -> StrategyOutcome {
        StrategyOutcome::TrainingFailed(EngineError::ModelTraining("boom".to_string()))
    }

    #[test]
    fn test_first_success_wins() {
        let frame = FeatureFrame::default();
        let result = run_strategies(
            "test",
            &frame,
            &[&Fixed("cached", skip), &Fixed("ensemble", fail), &Fixed("flat", flat)],
        )
        .unwrap();
        assert_eq!(result.source, ForecastSource::Flat);
    }

    #[test]
    fn test_exhausted_ladder_reports_training_error() {
        let frame = FeatureFrame::default();
        let err = run_strategies("test", &frame, &[&Fixed("a", skip), &Fixed("b", fail)]).unwrap_err();
        assert!(matches!(err, EngineError::ModelTraining(ref m) if m == "boom"));

        let err = run_strategies("test", &frame, &[&Fixed("a", skip)]).unwrap_err();
        assert!(matches!(err, EngineError::ModelTraining(_)));
    }
}
