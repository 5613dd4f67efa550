use crate::domain::errors::EngineError;
use serde::{Deserialize, Serialize};

/// Per-column standardization to zero mean and unit variance.
///
/// Uses the population standard deviation. Constant columns get a scale of 1
/// so they map to zero instead of dividing by zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(x: &[Vec<f64>]) -> Result<Self, EngineError> {
        let first = x
            .first()
            .ok_or_else(|| EngineError::ModelTraining("cannot fit scaler on zero rows".to_string()))?;
        let n_cols = first.len();
        if x.iter().any(|row| row.len() != n_cols) {
            return Err(EngineError::ModelTraining("ragged feature matrix".to_string()));
        }

        let n = x.len() as f64;
        let means: Vec<f64> = (0..n_cols)
            .map(|j| x.iter().map(|row| row[j]).sum::<f64>() / n)
            .collect();
        let scales = (0..n_cols)
            .map(|j| {
                let var = x.iter().map(|row| (row[j] - means[j]).powi(2)).sum::<f64>() / n;
                let std = var.sqrt();
                if std > 0.0 { std } else { 1.0 }
            })
            .collect();

        Ok(Self { means, scales })
    }

    pub fn n_features(&self) -> usize {
        self.means.len()
    }

    pub fn transform(&self, x: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, EngineError> {
        x.iter()
            .map(|row| {
                if row.len() != self.n_features() {
                    return Err(EngineError::InvalidInput(format!(
                        "scaler fitted on {} features, got {}",
                        self.n_features(),
                        row.len()
                    )));
                }
                Ok(row
                    .iter()
                    .zip(self.means.iter().zip(&self.scales))
                    .map(|(v, (m, s))| (v - m) / s)
                    .collect())
            })
            .collect()
    }

    pub fn fit_transform(x: &[Vec<f64>]) -> Result<(Self, Vec<Vec<f64>>), EngineError> {
        let scaler = Self::fit(x)?;
        let scaled = scaler.transform(x)?;
        Ok((scaler, scaled))
    }
}
