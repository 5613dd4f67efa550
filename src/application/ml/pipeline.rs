//! Training and inference steps shared by both forecast variants.

use super::ensemble::{Combination, EnsembleConfig, MemberPredictions, TreeEnsemble};
use super::gradient_boosting::{GradientBoostingParams, GradientBoostingRegressor};
use super::model_cache::CachedModel;
use super::scaler::StandardScaler;
use crate::domain::errors::EngineError;
use crate::domain::features::{Feature, FeatureFrame};

/// What the regressors learn to predict for row `t`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// `(close[t+1] - close[t]) / close[t]`
    PercentReturn,
    /// `close[t+1]`
    NextClose,
}

impl Target {
    /// Labels for every row except the last, which has no successor.
    pub fn values(&self, closes: &[f64]) -> Vec<f64> {
        closes
            .windows(2)
            .map(|w| match self {
                Target::PercentReturn => (w[1] - w[0]) / w[0],
                Target::NextClose => w[1],
            })
            .collect()
    }
}

/// Feature matrix over all labelled rows and the matching targets.
pub fn training_set(
    frame: &FeatureFrame,
    features: &[Feature],
    target: Target,
) -> Result<(Vec<Vec<f64>>, Vec<f64>), EngineError> {
    if frame.len() < 2 {
        return Err(EngineError::ModelTraining(format!(
            "need at least 2 rows to build a labelled set, got {}",
            frame.len()
        )));
    }
    let x = frame.matrix(features, 0..frame.len() - 1)?;
    let y = target.values(&frame.closes());
    Ok((x, y))
}

/// A trained-and-applied ensemble over the most recent `horizon` rows.
pub struct EnsembleRun {
    pub features: Vec<Feature>,
    pub scaler: StandardScaler,
    pub members: MemberPredictions,
    pub combined: Vec<f64>,
    /// Unscaled training matrix, kept for cross-validation.
    pub x: Vec<Vec<f64>>,
    pub x_scaled: Vec<Vec<f64>>,
    pub y: Vec<f64>,
}

impl EnsembleRun {
    /// Fits the single boosting model persisted as the cache representative.
    pub fn fit_cache_model(&self, params: GradientBoostingParams) -> Result<GradientBoostingRegressor, EngineError> {
        GradientBoostingRegressor::fit(&self.x_scaled, &self.y, params)
    }
}

pub fn run_ensemble(
    frame: &FeatureFrame,
    features: &[Feature],
    target: Target,
    config: &EnsembleConfig,
    combination: Combination,
    horizon: usize,
) -> Result<EnsembleRun, EngineError> {
    let (x, y) = training_set(frame, features, target)?;
    let (scaler, x_scaled) = StandardScaler::fit_transform(&x)?;
    let ensemble = TreeEnsemble::fit(&x_scaled, &y, config)?;

    let latest = frame.matrix(features, frame.tail_range(horizon))?;
    let latest_scaled = scaler.transform(&latest)?;
    let members = ensemble.predict_members(&latest_scaled)?;
    let combined = ensure_finite(members.combine(combination), "ensemble")?;

    Ok(EnsembleRun {
        features: features.to_vec(),
        scaler,
        members,
        combined,
        x,
        x_scaled,
        y,
    })
}

/// Single unscaled boosting model over a reduced column set.
pub fn run_reduced(
    frame: &FeatureFrame,
    features: &[Feature],
    target: Target,
    params: GradientBoostingParams,
    horizon: usize,
) -> Result<Vec<f64>, EngineError> {
    let (x, y) = training_set(frame, features, target)?;
    let model = GradientBoostingRegressor::fit(&x, &y, params)?;
    let latest = frame.matrix(features, frame.tail_range(horizon))?;
    ensure_finite(model.predict(&latest)?, "reduced model")
}

/// Applies a cached model to the most recent `horizon` rows of `features`.
pub fn predict_cached(
    cached: &CachedModel,
    frame: &FeatureFrame,
    features: &[Feature],
    horizon: usize,
) -> Result<Vec<f64>, EngineError> {
    let latest = frame.matrix(features, frame.tail_range(horizon))?;
    let scaled = cached.scaler.transform(&latest)?;
    ensure_finite(cached.model.predict(&scaled)?, "cached model")
}

/// `last_close * (1 + r)` for each predicted return.
pub fn returns_to_prices(last_close: f64, returns: &[f64]) -> Vec<f64> {
    returns.iter().map(|r| last_close * (1.0 + r)).collect()
}

fn ensure_finite(values: Vec<f64>, what: &str) -> Result<Vec<f64>, EngineError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(values)
    } else {
        Err(EngineError::ModelTraining(format!(
            "{} produced non-finite predictions",
            what
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_targets() {
        let closes = [100.0, 110.0, 99.0];
        let pct = Target::PercentReturn.values(&closes);
        assert_eq!(pct.len(), 2);
        assert!((pct[0] - 0.10).abs() < 1e-12);
        assert!((pct[1] + 0.10).abs() < 1e-12);
        assert_eq!(Target::NextClose.values(&closes), vec![110.0, 99.0]);
    }

    #[test]
    fn test_returns_to_prices() {
        assert_eq!(returns_to_prices(200.0, &[0.0, 0.5, -0.25]), vec![200.0, 300.0, 150.0]);
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(ensure_finite(vec![1.0, f64::NAN], "x").is_err());
        assert!(ensure_finite(vec![1.0], "x").is_ok());
    }
}
