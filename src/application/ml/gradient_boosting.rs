//! Least-squares gradient boosting on smartcore regression trees.
//!
//! Starts from the target mean and fits each tree to the current residuals,
//! shrinking its contribution by the learning rate. With `subsample < 1` each
//! round trains on a seeded random subset of rows (stochastic boosting).

use crate::domain::errors::EngineError;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::tree::decision_tree_regressor::{
    DecisionTreeRegressor, DecisionTreeRegressorParameters,
};

type Tree = DecisionTreeRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostingParams {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: u16,
    pub min_samples_split: usize,
    /// Fraction of rows drawn per round, in (0, 1].
    pub subsample: f64,
    pub seed: u64,
}

impl Default for GradientBoostingParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            min_samples_split: 2,
            subsample: 1.0,
            seed: 42,
        }
    }
}

impl GradientBoostingParams {
    pub fn new(n_estimators: usize, learning_rate: f64, max_depth: u16, seed: u64) -> Self {
        Self {
            n_estimators,
            learning_rate,
            max_depth,
            seed,
            ..Self::default()
        }
    }

    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split;
        self
    }

    pub fn with_subsample(mut self, subsample: f64) -> Self {
        self.subsample = subsample;
        self
    }
}

#[derive(Serialize, Deserialize)]
pub struct GradientBoostingRegressor {
    params: GradientBoostingParams,
    init: f64,
    n_features: usize,
    trees: Vec<Tree>,
}

impl GradientBoostingRegressor {
    pub fn fit(x: &[Vec<f64>], y: &[f64], params: GradientBoostingParams) -> Result<Self, EngineError> {
        if x.is_empty() || x.len() != y.len() {
            return Err(EngineError::ModelTraining(format!(
                "gradient boosting needs matching non-empty inputs, got {} rows and {} targets",
                x.len(),
                y.len()
            )));
        }
        if !(params.subsample > 0.0 && params.subsample <= 1.0) {
            return Err(EngineError::ModelTraining(format!(
                "subsample must be in (0, 1], got {}",
                params.subsample
            )));
        }

        let n = x.len();
        let n_features = x[0].len();
        let init = y.iter().sum::<f64>() / n as f64;
        let mut fitted = vec![init; n];
        let mut rng = StdRng::seed_from_u64(params.seed);
        let full = to_matrix(x)?;
        let sample_size = ((n as f64 * params.subsample) as usize).max(1);

        let tree_params = DecisionTreeRegressorParameters::default()
            .with_max_depth(params.max_depth)
            .with_min_samples_split(params.min_samples_split);

        let mut trees = Vec::with_capacity(params.n_estimators);
        for _ in 0..params.n_estimators {
            let residuals: Vec<f64> = y.iter().zip(&fitted).map(|(t, f)| t - f).collect();

            let tree = if sample_size < n {
                let rows = rand::seq::index::sample(&mut rng, n, sample_size).into_vec();
                let xs: Vec<Vec<f64>> = rows.iter().map(|&i| x[i].clone()).collect();
                let rs: Vec<f64> = rows.iter().map(|&i| residuals[i]).collect();
                Tree::fit(&to_matrix(&xs)?, &rs, tree_params.clone())
            } else {
                Tree::fit(&full, &residuals, tree_params.clone())
            }
            .map_err(|e| EngineError::ModelTraining(format!("tree fit failed: {}", e)))?;

            let step = tree
                .predict(&full)
                .map_err(|e| EngineError::ModelTraining(format!("tree predict failed: {}", e)))?;
            for (f, s) in fitted.iter_mut().zip(&step) {
                *f += params.learning_rate * s;
            }
            trees.push(tree);
        }

        Ok(Self {
            params,
            init,
            n_features,
            trees,
        })
    }

    pub fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>, EngineError> {
        if x.is_empty() {
            return Ok(Vec::new());
        }
        if x.iter().any(|row| row.len() != self.n_features) {
            return Err(EngineError::InvalidInput(format!(
                "model trained on {} features",
                self.n_features
            )));
        }
        let matrix = to_matrix(x)?;
        let mut out = vec![self.init; x.len()];
        for tree in &self.trees {
            let step = tree
                .predict(&matrix)
                .map_err(|e| EngineError::ModelTraining(format!("tree predict failed: {}", e)))?;
            for (o, s) in out.iter_mut().zip(&step) {
                *o += self.params.learning_rate * s;
            }
        }
        Ok(out)
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn params(&self) -> &GradientBoostingParams {
        &self.params
    }
}

pub(crate) fn to_matrix(x: &[Vec<f64>]) -> Result<DenseMatrix<f64>, EngineError> {
    DenseMatrix::from_2d_vec(&x.to_vec())
        .map_err(|e| EngineError::ModelTraining(format!("Matrix error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_data(n: usize) -> (Vec<Vec<f64>>, Vec<f64>) {
        let x: Vec<Vec<f64>> = (0..n)
            .map(|i| vec![i as f64, ((i * 7) % 11) as f64])
            .collect();
        let y = x.iter().map(|r| 2.0 * r[0] + 0.5 * r[1]).collect();
        (x, y)
    }

    #[test]
    fn test_boosting_reduces_error_below_mean_baseline() {
        let (x, y) = linear_data(80);
        let model = GradientBoostingRegressor::fit(&x, &y, GradientBoostingParams::new(50, 0.1, 3, 42)).unwrap();
        let pred = model.predict(&x).unwrap();

        let mean = y.iter().sum::<f64>() / y.len() as f64;
        let baseline: f64 = y.iter().map(|t| (t - mean).powi(2)).sum();
        let sse: f64 = y.iter().zip(&pred).map(|(t, p)| (t - p).powi(2)).sum();
        assert!(sse < baseline * 0.1);
    }

    #[test]
    fn test_subsampled_fit_is_deterministic() {
        let (x, y) = linear_data(60);
        let params = GradientBoostingParams::new(20, 0.05, 3, 7).with_subsample(0.8);
        let a = GradientBoostingRegressor::fit(&x, &y, params).unwrap().predict(&x).unwrap();
        let b = GradientBoostingRegressor::fit(&x, &y, params).unwrap().predict(&x).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_serde_round_trip_preserves_predictions() {
        let (x, y) = linear_data(40);
        let model = GradientBoostingRegressor::fit(&x, &y, GradientBoostingParams::new(10, 0.1, 2, 1)).unwrap();
        let bytes = serde_json::to_vec(&model).unwrap();
        let restored: GradientBoostingRegressor = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(model.predict(&x).unwrap(), restored.predict(&x).unwrap());
    }

    #[test]
    fn test_rejects_bad_inputs() {
        let (x, y) = linear_data(10);
        assert!(GradientBoostingRegressor::fit(&x, &y[..5], GradientBoostingParams::default()).is_err());
        assert!(
            GradientBoostingRegressor::fit(&x, &y, GradientBoostingParams::default().with_subsample(0.0))
                .is_err()
        );
        let model = GradientBoostingRegressor::fit(&x, &y, GradientBoostingParams::new(2, 0.1, 2, 1)).unwrap();
        assert!(model.predict(&[vec![1.0]]).is_err());
    }
}
