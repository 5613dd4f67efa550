//! Variant B: weighted ensemble forecast of the next close price.

use super::ensemble::{Combination, EnsembleConfig, ForestParams};
use super::gradient_boosting::GradientBoostingParams;
use super::model_cache::ModelCache;
use super::pipeline::{EnsembleRun, Target, predict_cached, run_ensemble, run_reduced};
use super::strategies::{ForecastStrategy, StrategyOutcome, run_strategies};
use crate::domain::errors::EngineError;
use crate::domain::features::FeatureFrame;
use crate::domain::ml::feature_registry::{
    ABSOLUTE_PRICE_CANDIDATES, ABSOLUTE_PRICE_DEFAULT, ABSOLUTE_PRICE_FALLBACK,
    ABSOLUTE_PRICE_FALLBACK_MIN_FEATURES,
};
use crate::domain::ml::{Forecast, ForecastSource, ForecastVariant};
use std::sync::Arc;
use tracing::{info, warn};

pub const DEFAULT_FORECAST_DAYS: usize = 14;

/// Multiplier applied to the last close when too few fallback columns exist.
pub const DEGENERATE_DRIFT: f64 = 1.001;

pub const ENSEMBLE_WEIGHTS: Combination = Combination::Weighted {
    forest: 0.3,
    extra_trees: 0.2,
    boosting: 0.5,
};

pub fn ensemble_config() -> EnsembleConfig {
    EnsembleConfig {
        forest: ForestParams::new(100, 10, 5, 42),
        extra_trees: ForestParams::new(100, 10, 5, 43),
        boosting: GradientBoostingParams::new(200, 0.05, 5, 44).with_min_samples_split(5),
    }
}

fn cache_model_params() -> GradientBoostingParams {
    GradientBoostingParams::new(200, 0.05, 5, 42)
}

fn reduced_model_params() -> GradientBoostingParams {
    GradientBoostingParams::new(100, 0.05, 3, 42).with_subsample(0.8)
}

#[derive(Clone, Default)]
pub struct AbsolutePriceForecaster {
    cache: Option<Arc<ModelCache>>,
}

impl AbsolutePriceForecaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache(mut self, cache: Arc<ModelCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn train_ensemble(&self, frame: &FeatureFrame, horizon: usize) -> Result<EnsembleRun, EngineError> {
        let features = frame.available(ABSOLUTE_PRICE_CANDIDATES);
        if features.is_empty() {
            return Err(EngineError::InvalidInput(
                "none of the absolute-price features are present".to_string(),
            ));
        }
        info!("Training with {} features: {:?}", features.len(), features);
        run_ensemble(
            frame,
            &features,
            Target::NextClose,
            &ensemble_config(),
            ENSEMBLE_WEIGHTS,
            horizon,
        )
    }

    /// Predicted closes for the last `horizon` rows of `frame`.
    ///
    /// Never fails once the input is valid: the ladder ends in a flat forecast.
    pub fn forecast(
        &self,
        frame: &FeatureFrame,
        horizon: usize,
        symbol: Option<&str>,
    ) -> Result<Forecast, EngineError> {
        if horizon == 0 {
            return Err(EngineError::InvalidInput("forecast horizon must be positive".to_string()));
        }
        let Some(last_close) = frame.last_close() else {
            return Err(EngineError::InsufficientSamples {
                required: 2,
                available: 0,
            });
        };
        let cache = match (&self.cache, symbol) {
            (Some(cache), Some(symbol)) => Some((cache.as_ref(), symbol)),
            _ => None,
        };

        let cached = Cached { cache, horizon };
        let ensemble = Ensemble {
            forecaster: self,
            cache,
            horizon,
        };
        let reduced = Reduced { horizon, last_close };
        let flat = Flat { horizon, last_close };

        run_strategies(
            symbol.unwrap_or("absolute-price forecast"),
            frame,
            &[&cached, &ensemble, &reduced, &flat],
        )
    }
}

fn price_forecast(source: ForecastSource, prices: Vec<f64>) -> Forecast {
    Forecast {
        variant: ForecastVariant::AbsolutePrice,
        source,
        prices,
    }
}

struct Cached<'a> {
    cache: Option<(&'a ModelCache, &'a str)>,
    horizon: usize,
}

impl ForecastStrategy for Cached<'_> {
    fn name(&self) -> &'static str {
        "cached"
    }

    fn attempt(&self, frame: &FeatureFrame) -> StrategyOutcome {
        let Some((cache, symbol)) = self.cache else {
            return StrategyOutcome::FeatureUnavailable("cache disabled".to_string());
        };
        let Some(record) = cache.load(symbol, ForecastVariant::AbsolutePrice) else {
            return StrategyOutcome::FeatureUnavailable("no cached model".to_string());
        };
        let features = if record.features.is_empty() {
            ABSOLUTE_PRICE_DEFAULT.to_vec()
        } else {
            record.features.clone()
        };
        if !record.is_usable_with(frame, &features) {
            info!("Cached features for {} not available in frame, retraining", symbol);
            return StrategyOutcome::FeatureUnavailable("cached feature set mismatch".to_string());
        }

        info!("Using cached model for {} with {} features", symbol, features.len());
        predict_cached(&record, frame, &features, self.horizon)
            .map(|prices| price_forecast(ForecastSource::Cached, prices))
            .into()
    }
}

struct Ensemble<'a> {
    forecaster: &'a AbsolutePriceForecaster,
    cache: Option<(&'a ModelCache, &'a str)>,
    horizon: usize,
}

impl ForecastStrategy for Ensemble<'_> {
    fn name(&self) -> &'static str {
        "ensemble"
    }

    fn attempt(&self, frame: &FeatureFrame) -> StrategyOutcome {
        let run = match self.forecaster.train_ensemble(frame, self.horizon) {
            Ok(run) => run,
            Err(EngineError::InvalidInput(reason)) => return StrategyOutcome::FeatureUnavailable(reason),
            Err(e) => return StrategyOutcome::TrainingFailed(e),
        };

        if let Some((cache, symbol)) = self.cache {
            let stored = run.fit_cache_model(cache_model_params()).and_then(|model| {
                cache.store(
                    symbol,
                    ForecastVariant::AbsolutePrice,
                    model,
                    run.scaler.clone(),
                    &run.features,
                    None,
                )
            });
            if let Err(e) = stored {
                warn!("Error caching model for {}: {}", symbol, e);
            }
        }

        StrategyOutcome::Success(price_forecast(ForecastSource::Ensemble, run.combined))
    }
}

struct Reduced {
    horizon: usize,
    last_close: f64,
}

impl ForecastStrategy for Reduced {
    fn name(&self) -> &'static str {
        "reduced"
    }

    fn attempt(&self, frame: &FeatureFrame) -> StrategyOutcome {
        let features = frame.available(ABSOLUTE_PRICE_FALLBACK);
        if features.len() < ABSOLUTE_PRICE_FALLBACK_MIN_FEATURES {
            warn!(
                "Only {} fallback features available, emitting drift forecast",
                features.len()
            );
            return StrategyOutcome::Success(price_forecast(
                ForecastSource::Degenerate,
                vec![self.last_close * DEGENERATE_DRIFT; self.horizon],
            ));
        }

        info!("Fallback using features: {:?}", features);
        run_reduced(
            frame,
            &features,
            Target::NextClose,
            reduced_model_params(),
            self.horizon,
        )
        .map(|prices| price_forecast(ForecastSource::ReducedModel, prices))
        .into()
    }
}

struct Flat {
    horizon: usize,
    last_close: f64,
}

impl ForecastStrategy for Flat {
    fn name(&self) -> &'static str {
        "flat"
    }

    fn attempt(&self, _frame: &FeatureFrame) -> StrategyOutcome {
        StrategyOutcome::Success(price_forecast(
            ForecastSource::Flat,
            vec![self.last_close; self.horizon],
        ))
    }
}
