use super::{Lookup, parse_optional, parse_or, process_env};
use crate::application::screening::default_workers;
use anyhow::Result;

/// Screening defaults applied when a request leaves them out.
#[derive(Debug, Clone)]
pub struct ScreeningEnvConfig {
    pub top_assets: usize,
    /// Inclusion threshold as a fraction (0.1 = 10%).
    pub forecast_threshold: f64,
    pub max_workers: usize,
}

impl Default for ScreeningEnvConfig {
    fn default() -> Self {
        Self {
            top_assets: 200,
            forecast_threshold: 0.1,
            max_workers: default_workers(),
        }
    }
}

impl ScreeningEnvConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&process_env)
    }

    pub fn from_lookup(lookup: Lookup<'_>) -> Result<Self> {
        let defaults = Self::default();
        let max_workers = parse_optional::<usize>(lookup, "MAX_WORKERS")?
            .map(|n| n.clamp(1, defaults.max_workers.max(1)))
            .unwrap_or(defaults.max_workers);

        Ok(Self {
            top_assets: parse_or(lookup, "DEFAULT_TOP_ASSETS", defaults.top_assets)?,
            forecast_threshold: parse_or(lookup, "DEFAULT_FORECAST_THRESHOLD", defaults.forecast_threshold)?,
            max_workers,
        })
    }
}
