use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Regression and directional scores for one held-out fold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoldMetrics {
    pub fold: usize,
    pub train_size: usize,
    pub test_size: usize,
    pub mse: f64,
    pub rmse: f64,
    pub mae: f64,
    pub r2: f64,
    /// Percentage of predictions whose sign matched the actual sign.
    pub direction_accuracy: f64,
}

impl FoldMetrics {
    /// Scores `predicted` against `actual`.
    ///
    /// R² follows the usual convention: a constant `actual` scores 1.0 on a
    /// perfect fit and 0.0 otherwise. `sign(0) == 0`, so a zero prediction
    /// only matches a zero target.
    pub fn score(fold: usize, train_size: usize, actual: &[f64], predicted: &[f64]) -> Self {
        let n = actual.len().min(predicted.len());
        if n == 0 {
            return Self {
                fold,
                train_size,
                test_size: 0,
                mse: 0.0,
                rmse: 0.0,
                mae: 0.0,
                r2: 0.0,
                direction_accuracy: 0.0,
            };
        }
        let nf = n as f64;
        let pairs = || actual.iter().zip(predicted.iter()).take(n);

        let ss_res: f64 = pairs().map(|(a, p)| (a - p).powi(2)).sum();
        let mse = ss_res / nf;
        let mae = pairs().map(|(a, p)| (a - p).abs()).sum::<f64>() / nf;

        let mean_actual = actual[..n].iter().sum::<f64>() / nf;
        let ss_tot: f64 = actual[..n].iter().map(|a| (a - mean_actual).powi(2)).sum();
        let r2 = if ss_tot > 0.0 {
            1.0 - ss_res / ss_tot
        } else if ss_res == 0.0 {
            1.0
        } else {
            0.0
        };

        let matches = pairs().filter(|(a, p)| sign(**a) == sign(**p)).count();

        Self {
            fold,
            train_size,
            test_size: n,
            mse,
            rmse: mse.sqrt(),
            mae,
            r2,
            direction_accuracy: matches as f64 / nf * 100.0,
        }
    }
}

fn sign(x: f64) -> i8 {
    if x > 0.0 {
        1
    } else if x < 0.0 {
        -1
    } else {
        0
    }
}

/// Per-metric aggregate across folds. Keys match the cache metadata format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricScores {
    pub mse: f64,
    pub rmse: f64,
    pub mae: f64,
    pub r2: f64,
    pub direction_accuracy: f64,
}

impl MetricScores {
    fn collect(folds: &[FoldMetrics], agg: impl Fn(Vec<f64>) -> f64) -> Self {
        let column = |f: fn(&FoldMetrics) -> f64| agg(folds.iter().map(f).collect());
        Self {
            mse: column(|m| m.mse),
            rmse: column(|m| m.rmse),
            mae: column(|m| m.mae),
            r2: column(|m| m.r2),
            direction_accuracy: column(|m| m.direction_accuracy),
        }
    }
}

/// Outcome of a k-fold cross-validation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossValidationSummary {
    pub k_folds: usize,
    pub folds: Vec<FoldMetrics>,
    pub avg_scores: MetricScores,
    /// Population standard deviation across folds.
    pub std_scores: MetricScores,
}

impl CrossValidationSummary {
    pub fn from_folds(k_folds: usize, folds: Vec<FoldMetrics>) -> Self {
        let avg_scores = MetricScores::collect(&folds, |v| if v.is_empty() { 0.0 } else { v.mean() });
        let std_scores = MetricScores::collect(&folds, |v| {
            if v.is_empty() {
                0.0
            } else {
                v.population_std_dev()
            }
        });
        Self {
            k_folds,
            folds,
            avg_scores,
            std_scores,
        }
    }

    pub fn total_test_size(&self) -> usize {
        self.folds.iter().map(|f| f.test_size).sum()
    }
}
