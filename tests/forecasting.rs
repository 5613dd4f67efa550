use std::sync::Arc;
use trendcast::application::indicators::{derive_extended_features, derive_primary_features};
use trendcast::application::ml::cross_validation::cross_validate_frame;
use trendcast::application::ml::forecast_pct::PERCENT_CHANGE_HORIZON;
use trendcast::application::ml::gradient_boosting::{GradientBoostingParams, GradientBoostingRegressor};
use trendcast::application::ml::scaler::StandardScaler;
use trendcast::application::ml::{AbsolutePriceForecaster, ModelCache, PercentChangeForecaster};
use trendcast::domain::errors::EngineError;
use trendcast::domain::features::Feature;
use trendcast::domain::ml::feature_registry::PERCENT_CHANGE_CANDIDATES;
use trendcast::domain::ml::{ForecastSource, ForecastVariant};
use trendcast::infrastructure::mock::{InMemoryModelStore, synthetic_bars};

fn assert_close(a: f64, b: f64) {
    assert!((a - b).abs() <= 1e-9 * (1.0 + a.abs().max(b.abs())), "{} != {}", a, b);
}

#[test]
fn test_percent_change_end_to_end() {
    let bars = synthetic_bars(500, 100.0, 0.001, 21);
    let frame = derive_primary_features(&bars).unwrap();
    assert!(frame.len() >= 280);
    let forecast = PercentChangeForecaster::new().forecast(&frame, None).unwrap();

    assert_eq!(forecast.variant, ForecastVariant::PercentChange);
    assert_eq!(forecast.source, ForecastSource::Ensemble);
    assert_eq!(forecast.len(), PERCENT_CHANGE_HORIZON);
    assert!(forecast.prices.iter().all(|p| p.is_finite() && *p > 0.0));
}

#[test]
fn test_percent_change_ensemble_is_member_mean() {
    let bars = synthetic_bars(400, 80.0, 0.0, 5);
    let frame = derive_primary_features(&bars).unwrap();
    let run = PercentChangeForecaster::new().train_ensemble(&frame).unwrap();

    assert_eq!(run.combined.len(), run.members.boosting.len());
    for (i, combined) in run.combined.iter().enumerate() {
        let mean = (run.members.forest[i] + run.members.extra_trees[i] + run.members.boosting[i]) / 3.0;
        assert_close(*combined, mean);
    }
}

#[test]
fn test_absolute_price_ensemble_is_weighted() {
    let bars = synthetic_bars(500, 30.0, 0.0008, 8);
    let frame = derive_extended_features(&bars).unwrap();
    let run = AbsolutePriceForecaster::new().train_ensemble(&frame, 14).unwrap();

    assert_eq!(run.combined.len(), 14);
    for (i, combined) in run.combined.iter().enumerate() {
        let weighted =
            0.3 * run.members.forest[i] + 0.2 * run.members.extra_trees[i] + 0.5 * run.members.boosting[i];
        assert_close(*combined, weighted);
    }
}

#[test]
fn test_cache_hit_after_training() {
    let cache = Arc::new(ModelCache::new(Arc::new(InMemoryModelStore::new())));
    let forecaster = PercentChangeForecaster::new().with_cache(cache.clone());
    let frame = derive_primary_features(&synthetic_bars(400, 100.0, 0.0, 13)).unwrap();

    let first = forecaster.forecast(&frame, Some("BTC/USDT")).unwrap();
    assert_eq!(first.source, ForecastSource::Ensemble);
    assert!(cache.metadata("BTC/USDT", ForecastVariant::PercentChange).is_some());

    let second = forecaster.forecast(&frame, Some("BTC/USDT")).unwrap();
    assert_eq!(second.source, ForecastSource::Cached);
    assert_eq!(second.len(), first.len());
}

#[test]
fn test_training_with_cross_validation_keeps_cv_results() {
    let cache = Arc::new(ModelCache::new(Arc::new(InMemoryModelStore::new())));
    let forecaster = PercentChangeForecaster::new()
        .with_cache(cache.clone())
        .with_cross_validation(true);
    let frame = derive_primary_features(&synthetic_bars(500, 100.0, 0.001, 21)).unwrap();

    let forecast = forecaster.forecast(&frame, Some("BTC/USDT")).unwrap();
    assert_eq!(forecast.source, ForecastSource::Ensemble);

    let metadata = cache.metadata("BTC/USDT", ForecastVariant::PercentChange).unwrap();
    assert!(metadata.cv_results.is_some());
    assert!(metadata.timestamp.is_some());
    assert!(metadata.trained_at.is_some());
    assert!(!metadata.features.is_empty());
}

#[test]
fn test_cache_feature_mismatch_retrains() {
    let cache = Arc::new(ModelCache::new(Arc::new(InMemoryModelStore::new())));
    let x: Vec<Vec<f64>> = (0..30).map(|i| vec![i as f64, (i % 4) as f64]).collect();
    let y: Vec<f64> = (0..30).map(|i| i as f64 * 0.01).collect();
    let (scaler, scaled) = StandardScaler::fit_transform(&x).unwrap();
    let model = GradientBoostingRegressor::fit(&scaled, &y, GradientBoostingParams::new(5, 0.1, 2, 42)).unwrap();
    // Stochastic %K only exists in the extended indicator set.
    cache
        .store(
            "ETH/USDT",
            ForecastVariant::PercentChange,
            model,
            scaler,
            &[Feature::Rsi, Feature::StochasticK],
            None,
        )
        .unwrap();

    let frame = derive_primary_features(&synthetic_bars(400, 100.0, 0.0, 17)).unwrap();
    let forecast = PercentChangeForecaster::new()
        .with_cache(cache)
        .forecast(&frame, Some("ETH/USDT"))
        .unwrap();
    assert_eq!(forecast.source, ForecastSource::Ensemble);
}

#[test]
fn test_cross_validation_folds() {
    let frame = derive_primary_features(&synthetic_bars(400, 100.0, 0.0, 3)).unwrap();
    let features = frame.available(PERCENT_CHANGE_CANDIDATES);
    let summary = cross_validate_frame(&frame, &features, 5).unwrap();
    assert_eq!(summary.folds.len(), 5);
    assert_eq!(summary.total_test_size(), frame.len() - 1);
    assert!((0.0..=100.0).contains(&summary.avg_scores.direction_accuracy));
}

#[test]
fn test_cross_validation_insufficient_data() {
    let bars = synthetic_bars(300, 100.0, 0.0, 3);
    let frame = derive_primary_features(&bars).unwrap();
    let features = frame.available(PERCENT_CHANGE_CANDIDATES);
    let err = cross_validate_frame(&frame, &features, 200).unwrap_err();
    assert!(matches!(err, EngineError::InsufficientSamples { .. }));
}
