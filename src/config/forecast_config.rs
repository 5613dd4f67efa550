//! Forecast, sentiment and model cache configuration.

use super::{Lookup, parse_optional, parse_or, process_env};
use crate::application::ml::forecast_price::DEFAULT_FORECAST_DAYS;
use anyhow::{Result, anyhow};
use chrono::Duration;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ForecastEnvConfig {
    /// Default Variant B horizon in days.
    pub forecast_days: usize,
    /// Articles averaged per sentiment score.
    pub news_limit: usize,
    pub news_api_key: String,
    pub model_cache_dir: PathBuf,
    /// Unset means cached models never expire.
    pub cache_max_age_hours: Option<u64>,
}

impl Default for ForecastEnvConfig {
    fn default() -> Self {
        Self {
            forecast_days: DEFAULT_FORECAST_DAYS,
            news_limit: 140,
            news_api_key: String::new(),
            model_cache_dir: PathBuf::from("model_cache"),
            cache_max_age_hours: None,
        }
    }
}

impl ForecastEnvConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&process_env)
    }

    pub fn from_lookup(lookup: Lookup<'_>) -> Result<Self> {
        let defaults = Self::default();
        let cache_max_age_hours: Option<u64> = parse_optional(lookup, "MODEL_CACHE_MAX_AGE_HOURS")?;
        if let Some(hours) = cache_max_age_hours {
            max_age_from_hours(hours)
                .ok_or_else(|| anyhow!("MODEL_CACHE_MAX_AGE_HOURS={} is out of range", hours))?;
        }

        Ok(Self {
            forecast_days: parse_or(lookup, "DEFAULT_FORECAST_DAYS", defaults.forecast_days)?,
            news_limit: parse_or(lookup, "DEFAULT_NEWS_LIMIT", defaults.news_limit)?,
            news_api_key: lookup("NEWS_API_KEY").unwrap_or_default().trim().to_string(),
            model_cache_dir: lookup("MODEL_CACHE_DIR")
                .filter(|d| !d.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.model_cache_dir),
            cache_max_age_hours,
        })
    }

    /// `None` when unset. Values accepted by `from_lookup` always convert.
    pub fn cache_max_age(&self) -> Option<Duration> {
        self.cache_max_age_hours.and_then(max_age_from_hours)
    }
}

fn max_age_from_hours(hours: u64) -> Option<Duration> {
    Duration::try_hours(i64::try_from(hours).ok()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_support::lookup_from;

    #[test]
    fn test_cache_max_age() {
        let lookup = lookup_from(&[("MODEL_CACHE_MAX_AGE_HOURS", "6"), ("NEWS_API_KEY", " abc ")]);
        let config = ForecastEnvConfig::from_lookup(&lookup).unwrap();
        assert_eq!(config.cache_max_age(), Some(Duration::hours(6)));
        assert_eq!(config.news_api_key, "abc");
        assert!(ForecastEnvConfig::default().cache_max_age().is_none());
    }

    #[test]
    fn test_huge_cache_max_age_is_rejected() {
        let lookup = lookup_from(&[("MODEL_CACHE_MAX_AGE_HOURS", &u64::MAX.to_string())]);
        let err = ForecastEnvConfig::from_lookup(&lookup).unwrap_err();
        assert!(format!("{:#}", err).contains("MODEL_CACHE_MAX_AGE_HOURS"));
    }
}
