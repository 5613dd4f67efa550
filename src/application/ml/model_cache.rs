//! Persistent per-(asset, variant) model cache.
//!
//! A record is a serialized gradient-boosting model together with the scaler
//! it was trained behind, plus a JSON metadata blob naming the ordered feature
//! columns. Loading never fails the caller: anything unreadable is a miss.

use super::gradient_boosting::GradientBoostingRegressor;
use super::scaler::StandardScaler;
use crate::domain::errors::EngineError;
use crate::domain::features::{Feature, FeatureFrame};
use crate::domain::market::symbol::to_storage_key;
use crate::domain::ml::ForecastVariant;
use crate::domain::ml::feature_registry::{feature_names, parse_feature_names};
use crate::domain::performance::{CrossValidationSummary, MetricScores};
use crate::domain::ports::ModelStore;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Metadata stored beside a cached model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheMetadata {
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub n_features: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trained_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cv_results: Option<MetricScores>,
    /// When `cv_results` were recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize)]
struct ModelArtifact {
    model: GradientBoostingRegressor,
    scaler: StandardScaler,
}

/// A loaded cache record.
pub struct CachedModel {
    pub model: GradientBoostingRegressor,
    pub scaler: StandardScaler,
    /// Training-time column order. Empty when the metadata listed none.
    pub features: Vec<Feature>,
    pub metadata: CacheMetadata,
}

impl CachedModel {
    /// Whether `features` can be fed to this model from `frame`: every column
    /// present, and as many columns as the model was trained on.
    pub fn is_usable_with(&self, frame: &FeatureFrame, features: &[Feature]) -> bool {
        !features.is_empty()
            && frame.contains_all(features)
            && features.len() == self.model.n_features()
            && features.len() == self.scaler.n_features()
    }
}

pub struct ModelCache {
    store: Arc<dyn ModelStore>,
    max_age: Option<Duration>,
}

impl ModelCache {
    pub fn new(store: Arc<dyn ModelStore>) -> Self {
        Self {
            store,
            max_age: None,
        }
    }

    /// Records older than `max_age` are reported as misses.
    pub fn with_max_age(mut self, max_age: Option<Duration>) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn key(symbol: &str, variant: ForecastVariant) -> String {
        format!("{}_{}", to_storage_key(symbol), variant.cache_tag())
    }

    /// Overwrites any previous record for (`symbol`, `variant`). A
    /// `cv_summary` is recorded in the metadata with the current time.
    pub fn store(
        &self,
        symbol: &str,
        variant: ForecastVariant,
        model: GradientBoostingRegressor,
        scaler: StandardScaler,
        features: &[Feature],
        cv_summary: Option<&CrossValidationSummary>,
    ) -> Result<(), EngineError> {
        let key = Self::key(symbol, variant);
        let artifact = ModelArtifact { model, scaler };
        let bytes = serde_json::to_vec(&artifact).map_err(|e| EngineError::cache(&key, e))?;
        self.store
            .save_model(&key, &bytes)
            .map_err(|e| EngineError::cache(&key, e))?;

        let now = Utc::now();
        let metadata = CacheMetadata {
            features: feature_names(features),
            n_features: features.len(),
            trained_at: Some(now),
            cv_results: cv_summary.map(|summary| summary.avg_scores.clone()),
            timestamp: cv_summary.map(|_| now),
        };
        self.write_metadata(&key, &metadata)?;

        info!("Model cached for {} with {} features", key, features.len());
        Ok(())
    }

    pub fn load(&self, symbol: &str, variant: ForecastVariant) -> Option<CachedModel> {
        let key = Self::key(symbol, variant);
        match self.try_load(&key) {
            Ok(Some(record)) => Some(record),
            Ok(None) => {
                debug!("No cached model for {}", key);
                None
            }
            Err(e) => {
                warn!("Treating cache entry as miss: {}", e);
                None
            }
        }
    }

    fn try_load(&self, key: &str) -> Result<Option<CachedModel>, EngineError> {
        let Some(bytes) = self
            .store
            .load_model(key)
            .map_err(|e| EngineError::cache(key, e))?
        else {
            return Ok(None);
        };
        let artifact: ModelArtifact =
            serde_json::from_slice(&bytes).map_err(|e| EngineError::cache(key, e))?;
        let metadata = self.read_metadata(key)?.unwrap_or_default();

        if let Some(max_age) = self.max_age {
            let fresh = metadata
                .trained_at
                .is_some_and(|trained| Utc::now() - trained <= max_age);
            if !fresh {
                info!("Cached model {} is older than {:?}, ignoring", key, max_age);
                return Ok(None);
            }
        }

        Ok(Some(CachedModel {
            model: artifact.model,
            scaler: artifact.scaler,
            features: parse_feature_names(&metadata.features),
            metadata,
        }))
    }

    pub fn metadata(&self, symbol: &str, variant: ForecastVariant) -> Option<CacheMetadata> {
        let key = Self::key(symbol, variant);
        self.read_metadata(&key).ok().flatten()
    }

    /// Merges averaged cross-validation scores into the record's metadata,
    /// creating the metadata with `features` if none exists yet.
    pub fn record_cross_validation(
        &self,
        symbol: &str,
        variant: ForecastVariant,
        summary: &CrossValidationSummary,
        features: &[Feature],
    ) -> Result<(), EngineError> {
        let key = Self::key(symbol, variant);
        let mut metadata = self.read_metadata(&key).ok().flatten().unwrap_or_else(|| CacheMetadata {
            features: feature_names(features),
            n_features: features.len(),
            ..CacheMetadata::default()
        });
        metadata.cv_results = Some(summary.avg_scores.clone());
        metadata.timestamp = Some(Utc::now());
        self.write_metadata(&key, &metadata)
    }

    fn read_metadata(&self, key: &str) -> Result<Option<CacheMetadata>, EngineError> {
        let Some(bytes) = self
            .store
            .load_metadata(key)
            .map_err(|e| EngineError::cache(key, e))?
        else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| EngineError::cache(key, e))
    }

    fn write_metadata(&self, key: &str, metadata: &CacheMetadata) -> Result<(), EngineError> {
        let bytes = serde_json::to_vec(metadata).map_err(|e| EngineError::cache(key, e))?;
        self.store
            .save_metadata(key, &bytes)
            .map_err(|e| EngineError::cache(key, e))
    }
}
