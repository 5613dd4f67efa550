use super::gradient_boosting::{GradientBoostingParams, GradientBoostingRegressor};
use super::pipeline::{Target, training_set};
use super::scaler::StandardScaler;
use crate::domain::errors::EngineError;
use crate::domain::features::{Feature, FeatureFrame};
use crate::domain::performance::{CrossValidationSummary, FoldMetrics};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::info;

pub const DEFAULT_FOLDS: usize = 5;
const SHUFFLE_SEED: u64 = 42;

fn fold_model_params() -> GradientBoostingParams {
    GradientBoostingParams::new(100, 0.05, 4, 42)
}

/// Shuffled k-fold split. Returns `(train, test)` index sets; the first
/// `n % k` folds hold one extra test row.
pub fn k_fold_indices(n: usize, k: usize, seed: u64) -> Vec<(Vec<usize>, Vec<usize>)> {
    let mut order: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    order.shuffle(&mut rng);

    let base = n / k.max(1);
    let extra = n % k.max(1);
    let mut start = 0;
    (0..k)
        .map(|fold| {
            let size = base + usize::from(fold < extra);
            let test: Vec<usize> = order[start..start + size].to_vec();
            let train: Vec<usize> = order[..start]
                .iter()
                .chain(&order[start + size..])
                .copied()
                .collect();
            start += size;
            (train, test)
        })
        .collect()
}

/// k-fold evaluation of a boosting regressor on `x`/`y`.
///
/// Requires at least `2 * k` rows; each fold standardizes on its own
/// training rows only.
pub fn cross_validate(x: &[Vec<f64>], y: &[f64], k: usize) -> Result<CrossValidationSummary, EngineError> {
    if k < 2 {
        return Err(EngineError::InvalidInput(format!(
            "cross-validation needs at least 2 folds, got {}",
            k
        )));
    }
    let n = x.len().min(y.len());
    if n < 2 * k {
        return Err(EngineError::InsufficientSamples {
            required: 2 * k,
            available: n,
        });
    }

    let folds = k_fold_indices(n, k, SHUFFLE_SEED)
        .into_iter()
        .enumerate()
        .map(|(fold, (train, test))| {
            let x_train: Vec<Vec<f64>> = train.iter().map(|&i| x[i].clone()).collect();
            let y_train: Vec<f64> = train.iter().map(|&i| y[i]).collect();
            let x_test: Vec<Vec<f64>> = test.iter().map(|&i| x[i].clone()).collect();
            let y_test: Vec<f64> = test.iter().map(|&i| y[i]).collect();

            let (scaler, x_train_scaled) = StandardScaler::fit_transform(&x_train)?;
            let model = GradientBoostingRegressor::fit(&x_train_scaled, &y_train, fold_model_params())?;
            let predicted = model.predict(&scaler.transform(&x_test)?)?;

            Ok(FoldMetrics::score(fold, train.len(), &y_test, &predicted))
        })
        .collect::<Result<Vec<_>, EngineError>>()?;

    let summary = CrossValidationSummary::from_folds(k, folds);
    info!(
        "Cross-validation ({} folds): direction accuracy {:.2}%, RMSE {:.6}",
        k, summary.avg_scores.direction_accuracy, summary.avg_scores.rmse
    );
    Ok(summary)
}

/// Cross-validates `features` of `frame` against the next-bar percentage
/// return.
pub fn cross_validate_frame(
    frame: &FeatureFrame,
    features: &[Feature],
    k: usize,
) -> Result<CrossValidationSummary, EngineError> {
    if features.is_empty() {
        return Err(EngineError::InvalidInput(
            "no features available for cross-validation".to_string(),
        ));
    }
    if frame.len() < 2 {
        return Err(EngineError::InsufficientSamples {
            required: 2 * k,
            available: frame.len().saturating_sub(1),
        });
    }
    let (x, y) = training_set(frame, features, Target::PercentReturn)?;
    cross_validate(&x, &y, k)
}
