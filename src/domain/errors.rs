use thiserror::Error;

/// Errors raised by the indicator and forecasting engine.
///
/// Only `DataUnavailable`, `ModelTraining` (after every fallback failed),
/// `InsufficientSamples` and `InvalidInput` ever reach a caller. Indicator and
/// cache failures are absorbed where they happen.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Data unavailable for {asset}: {reason}")]
    DataUnavailable { asset: String, reason: String },

    #[error("Indicator computation failed: {0}")]
    IndicatorComputation(String),

    #[error("Model training failed: {0}")]
    ModelTraining(String),

    #[error("Model cache error for {key}: {reason}")]
    Cache { key: String, reason: String },

    #[error("Insufficient samples: need {required}, got {available}")]
    InsufficientSamples { required: usize, available: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl EngineError {
    pub fn data_unavailable(asset: &str, reason: impl Into<String>) -> Self {
        Self::DataUnavailable {
            asset: asset.to_string(),
            reason: reason.into(),
        }
    }

    pub fn cache(key: &str, reason: impl ToString) -> Self {
        Self::Cache {
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether the error should be reported to the caller as a client-side
    /// problem (4xx) rather than an internal failure.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::DataUnavailable { .. } | Self::InsufficientSamples { .. } | Self::InvalidInput(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_error_formatting() {
        let err = EngineError::InsufficientSamples {
            required: 10,
            available: 7,
        };
        let msg = err.to_string();
        assert!(msg.contains("10"));
        assert!(msg.contains("7"));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_training_error_is_internal() {
        let err = EngineError::ModelTraining("singular matrix".to_string());
        assert!(!err.is_client_error());
        assert!(err.to_string().contains("singular matrix"));
    }
}
