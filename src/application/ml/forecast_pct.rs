//! Variant A: ensemble forecast of the next-bar percentage return.
//!
//! Predictions cover the most recent 48 rows and are returned as price levels
//! (`last_close * (1 + r)`), whichever strategy produced them.

use super::cross_validation::{DEFAULT_FOLDS, cross_validate};
use super::ensemble::{Combination, EnsembleConfig, ForestParams};
use super::gradient_boosting::GradientBoostingParams;
use super::model_cache::ModelCache;
use super::pipeline::{EnsembleRun, Target, predict_cached, returns_to_prices, run_ensemble, run_reduced};
use super::strategies::{ForecastStrategy, StrategyOutcome, run_strategies};
use crate::domain::errors::EngineError;
use crate::domain::features::FeatureFrame;
use crate::domain::ml::feature_registry::{PERCENT_CHANGE_CANDIDATES, PERCENT_CHANGE_FALLBACK};
use crate::domain::ml::{Forecast, ForecastSource, ForecastVariant};
use std::sync::Arc;
use tracing::{info, warn};

pub const PERCENT_CHANGE_HORIZON: usize = 48;

pub fn ensemble_config() -> EnsembleConfig {
    EnsembleConfig {
        forest: ForestParams::new(100, 10, 5, 42),
        extra_trees: ForestParams::new(100, 10, 5, 43),
        boosting: GradientBoostingParams::new(100, 0.05, 4, 44),
    }
}

fn cache_model_params() -> GradientBoostingParams {
    GradientBoostingParams::new(100, 0.05, 4, 42)
}

fn reduced_model_params() -> GradientBoostingParams {
    GradientBoostingParams::new(100, 0.05, 3, 42)
        .with_min_samples_split(5)
        .with_subsample(0.8)
}

#[derive(Clone, Default)]
pub struct PercentChangeForecaster {
    cache: Option<Arc<ModelCache>>,
    cross_validate: bool,
}

impl PercentChangeForecaster {
    /// Forecaster that never touches a model cache.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache(mut self, cache: Arc<ModelCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Also cross-validate after a fresh training run and record the scores
    /// in the cache metadata.
    pub fn with_cross_validation(mut self, enabled: bool) -> Self {
        self.cross_validate = enabled;
        self
    }

    /// Trains the full ensemble and applies it to the latest rows, without
    /// consulting or writing the cache.
    pub fn train_ensemble(&self, frame: &FeatureFrame) -> Result<EnsembleRun, EngineError> {
        let features = frame.available(PERCENT_CHANGE_CANDIDATES);
        if features.is_empty() {
            return Err(EngineError::InvalidInput(
                "none of the percentage-change features are present".to_string(),
            ));
        }
        info!("Training with features: {:?}", features);
        run_ensemble(
            frame,
            &features,
            Target::PercentReturn,
            &ensemble_config(),
            Combination::Mean,
            PERCENT_CHANGE_HORIZON,
        )
    }

    /// Forecast for `frame`. With `symbol` and a cache configured, a
    /// compatible cached model short-circuits training.
    pub fn forecast(&self, frame: &FeatureFrame, symbol: Option<&str>) -> Result<Forecast, EngineError> {
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

        let cached = Cached { cache, last_close };
        let ensemble = Ensemble {
            forecaster: self,
            cache,
            last_close,
        };
        let reduced = Reduced { last_close };

        run_strategies(
            symbol.unwrap_or("percent-change forecast"),
            frame,
            &[&cached, &ensemble, &reduced],
        )
    }
}

fn price_forecast(source: ForecastSource, last_close: f64, returns: &[f64]) -> Forecast {
    Forecast {
        variant: ForecastVariant::PercentChange,
        source,
        prices: returns_to_prices(last_close, returns),
    }
}

struct Cached<'a> {
    cache: Option<(&'a ModelCache, &'a str)>,
    last_close: f64,
}

impl ForecastStrategy for Cached<'_> {
    fn name(&self) -> &'static str {
        "cached"
    }

    fn attempt(&self, frame: &FeatureFrame) -> StrategyOutcome {
        let Some((cache, symbol)) = self.cache else {
            return StrategyOutcome::FeatureUnavailable("cache disabled".to_string());
        };
        let Some(record) = cache.load(symbol, ForecastVariant::PercentChange) else {
            return StrategyOutcome::FeatureUnavailable("no cached model".to_string());
        };
        if !record.is_usable_with(frame, &record.features) {
            info!("Cached features for {} not available in frame, retraining", symbol);
            return StrategyOutcome::FeatureUnavailable("cached feature set mismatch".to_string());
        }

        info!("Using cached model for {}", symbol);
        predict_cached(&record, frame, &record.features, PERCENT_CHANGE_HORIZON)
            .map(|returns| price_forecast(ForecastSource::Cached, self.last_close, &returns))
            .into()
    }
}

struct Ensemble<'a> {
    forecaster: &'a PercentChangeForecaster,
    cache: Option<(&'a ModelCache, &'a str)>,
    last_close: f64,
}

impl Ensemble<'_> {
    fn persist(&self, run: &EnsembleRun) {
        let Some((cache, symbol)) = self.cache else {
            return;
        };

        let summary = if self.forecaster.cross_validate {
            match cross_validate(&run.x, &run.y, DEFAULT_FOLDS) {
                Ok(summary) => Some(summary),
                Err(e) => {
                    warn!("Cross-validation for {} skipped: {}", symbol, e);
                    None
                }
            }
        } else {
            None
        };

        let stored = run.fit_cache_model(cache_model_params()).and_then(|model| {
            cache.store(
                symbol,
                ForecastVariant::PercentChange,
                model,
                run.scaler.clone(),
                &run.features,
                summary.as_ref(),
            )
        });
        if let Err(e) = stored {
            warn!("Error caching model for {}: {}", symbol, e);
        }
    }
}

impl ForecastStrategy for Ensemble<'_> {
    fn name(&self) -> &'static str {
        "ensemble"
    }

    fn attempt(&self, frame: &FeatureFrame) -> StrategyOutcome {
        match self.forecaster.train_ensemble(frame) {
            Ok(run) => {
                self.persist(&run);
                StrategyOutcome::Success(price_forecast(
                    ForecastSource::Ensemble,
                    self.last_close,
                    &run.combined,
                ))
            }
            Err(EngineError::InvalidInput(reason)) => StrategyOutcome::FeatureUnavailable(reason),
            Err(e) => StrategyOutcome::TrainingFailed(e),
        }
    }
}

struct Reduced {
    last_close: f64,
}

impl ForecastStrategy for Reduced {
    fn name(&self) -> &'static str {
        "reduced"
    }

    fn attempt(&self, frame: &FeatureFrame) -> StrategyOutcome {
        let features = frame.available(PERCENT_CHANGE_FALLBACK);
        if features.is_empty() {
            return StrategyOutcome::FeatureUnavailable("no fallback features present".to_string());
        }
        info!("Fallback using features: {:?}", features);
        run_reduced(
            frame,
            &features,
            Target::PercentReturn,
            reduced_model_params(),
            PERCENT_CHANGE_HORIZON,
        )
        .map(|returns| price_forecast(ForecastSource::ReducedModel, self.last_close, &returns))
        .into()
    }
}
