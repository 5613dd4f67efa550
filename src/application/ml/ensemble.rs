use super::gradient_boosting::{GradientBoostingParams, GradientBoostingRegressor, to_matrix};
use crate::domain::errors::EngineError;
use smartcore::ensemble::extra_trees_regressor::{
    ExtraTreesRegressor, ExtraTreesRegressorParameters,
};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: u16,
    pub min_samples_split: usize,
    pub seed: u64,
}

impl ForestParams {
    pub fn new(n_trees: usize, max_depth: u16, min_samples_split: usize, seed: u64) -> Self {
        Self {
            n_trees,
            max_depth,
            min_samples_split,
            seed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnsembleConfig {
    pub forest: ForestParams,
    pub extra_trees: ForestParams,
    pub boosting: GradientBoostingParams,
}

/// How member predictions are merged into one series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Combination {
    /// Equal-weight arithmetic mean.
    Mean,
    Weighted {
        forest: f64,
        extra_trees: f64,
        boosting: f64,
    },
}

impl Combination {
    pub fn combine(&self, forest: f64, extra_trees: f64, boosting: f64) -> f64 {
        match *self {
            Combination::Mean => (forest + extra_trees + boosting) / 3.0,
            Combination::Weighted {
                forest: wf,
                extra_trees: we,
                boosting: wb,
            } => forest * wf + extra_trees * we + boosting * wb,
        }
    }
}

/// Per-member predictions, aligned row by row.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberPredictions {
    pub forest: Vec<f64>,
    pub extra_trees: Vec<f64>,
    pub boosting: Vec<f64>,
}

impl MemberPredictions {
    pub fn combine(&self, combination: Combination) -> Vec<f64> {
        self.forest
            .iter()
            .zip(&self.extra_trees)
            .zip(&self.boosting)
            .map(|((f, e), b)| combination.combine(*f, *e, *b))
            .collect()
    }
}

/// Random forest, extra trees and gradient boosting trained on the same matrix.
pub struct TreeEnsemble {
    forest: RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>,
    extra_trees: ExtraTreesRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>,
    boosting: GradientBoostingRegressor,
}

impl TreeEnsemble {
    pub fn fit(x: &[Vec<f64>], y: &[f64], config: &EnsembleConfig) -> Result<Self, EngineError> {
        if x.is_empty() || x.len() != y.len() {
            return Err(EngineError::ModelTraining(format!(
                "ensemble needs matching non-empty inputs, got {} rows and {} targets",
                x.len(),
                y.len()
            )));
        }
        let matrix = to_matrix(x)?;
        let targets = y.to_vec();

        let forest_params = RandomForestRegressorParameters::default()
            .with_n_trees(config.forest.n_trees)
            .with_max_depth(config.forest.max_depth)
            .with_min_samples_split(config.forest.min_samples_split)
            .with_seed(config.forest.seed);
        let forest = RandomForestRegressor::fit(&matrix, &targets, forest_params)
            .map_err(|e| EngineError::ModelTraining(format!("random forest: {}", e)))?;

        let extra_params = ExtraTreesRegressorParameters::default()
            .with_n_trees(config.extra_trees.n_trees)
            .with_max_depth(config.extra_trees.max_depth)
            .with_min_samples_split(config.extra_trees.min_samples_split)
            .with_seed(config.extra_trees.seed);
        let extra_trees = ExtraTreesRegressor::fit(&matrix, &targets, extra_params)
            .map_err(|e| EngineError::ModelTraining(format!("extra trees: {}", e)))?;

        let boosting = GradientBoostingRegressor::fit(x, y, config.boosting)?;

        debug!(
            "Trained tree ensemble on {} rows x {} features",
            x.len(),
            x[0].len()
        );

        Ok(Self {
            forest,
            extra_trees,
            boosting,
        })
    }

    pub fn predict_members(&self, x: &[Vec<f64>]) -> Result<MemberPredictions, EngineError> {
        let matrix = to_matrix(x)?;
        let forest = self
            .forest
            .predict(&matrix)
            .map_err(|e| EngineError::ModelTraining(format!("random forest predict: {}", e)))?;
        let extra_trees = self
            .extra_trees
            .predict(&matrix)
            .map_err(|e| EngineError::ModelTraining(format!("extra trees predict: {}", e)))?;
        let boosting = self.boosting.predict(x)?;
        Ok(MemberPredictions {
            forest,
            extra_trees,
            boosting,
        })
    }

    pub fn predict(&self, x: &[Vec<f64>], combination: Combination) -> Result<Vec<f64>, EngineError> {
        Ok(self.predict_members(x)?.combine(combination))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_combination_is_exact() {
        let members = MemberPredictions {
            forest: vec![0.1, -0.2],
            extra_trees: vec![0.3, 0.0],
            boosting: vec![0.2, 0.5],
        };
        let combined = members.combine(Combination::Mean);
        assert_eq!(combined[0], (0.1 + 0.3 + 0.2) / 3.0);
        assert_eq!(combined[1], (-0.2 + 0.0 + 0.5) / 3.0);
    }

    #[test]
    fn test_weighted_combination() {
        let weights = Combination::Weighted {
            forest: 0.3,
            extra_trees: 0.2,
            boosting: 0.5,
        };
        assert!((weights.combine(100.0, 110.0, 120.0) - 112.0).abs() < 1e-9);
    }
}
