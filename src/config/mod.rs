//! Configuration module for trendcast.
//!
//! Structured configuration loaded from environment variables, organized by
//! concern: Market, Screening, Forecast and Risk. Binaries call
//! `dotenvy::dotenv()` before `EngineConfig::from_env()`.

mod forecast_config;
mod market_config;
mod risk_env_config;
mod screening_config;

pub use forecast_config::ForecastEnvConfig;
pub use market_config::MarketEnvConfig;
pub use risk_env_config::RiskEnvConfig;
pub use screening_config::ScreeningEnvConfig;

use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

/// Variable lookup used by every sub-config. `from_env` passes the process
/// environment; tests pass a map.
pub(crate) type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

pub(crate) fn process_env(key: &str) -> Option<String> {
    env::var(key).ok()
}

/// Parses `key` when set, `default` otherwise. A set but malformed value is an
/// error naming the variable.
pub(crate) fn parse_or<T>(lookup: Lookup<'_>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Failed to parse {}={:?}", key, raw)),
        _ => Ok(default),
    }
}

pub(crate) fn parse_optional<T>(lookup: Lookup<'_>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("Failed to parse {}={:?}", key, raw)),
        _ => Ok(None),
    }
}

/// Main engine configuration.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub market: MarketEnvConfig,
    pub screening: ScreeningEnvConfig,
    pub forecast: ForecastEnvConfig,
    pub risk: RiskEnvConfig,
}

impl EngineConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&process_env)
    }

    pub fn from_lookup(lookup: Lookup<'_>) -> Result<Self> {
        Ok(Self {
            market: MarketEnvConfig::from_lookup(lookup).context("Failed to load market config")?,
            screening: ScreeningEnvConfig::from_lookup(lookup)
                .context("Failed to load screening config")?,
            forecast: ForecastEnvConfig::from_lookup(lookup)
                .context("Failed to load forecast config")?,
            risk: RiskEnvConfig::from_lookup(lookup).context("Failed to load risk config")?,
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::HashMap;

    pub fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::lookup_from;
    use super::*;

    #[test]
    fn test_defaults_when_unset() {
        let lookup = lookup_from(&[]);
        let config = EngineConfig::from_lookup(&lookup).unwrap();
        assert_eq!(config.market.quote, "USDT");
        assert_eq!(config.market.limit, 500);
        assert_eq!(config.screening.top_assets, 200);
        assert_eq!(config.forecast.forecast_days, 14);
        assert!(config.forecast.cache_max_age_hours.is_none());
    }

    #[test]
    fn test_invalid_number_is_rejected_with_variable_name() {
        let lookup = lookup_from(&[("DEFAULT_LIMIT", "many")]);
        let err = EngineConfig::from_lookup(&lookup).unwrap_err();
        assert!(format!("{:#}", err).contains("DEFAULT_LIMIT"));
    }

    #[test]
    fn test_blank_value_falls_back_to_default() {
        let lookup = lookup_from(&[("DEFAULT_TOP_ASSETS", "  ")]);
        let config = EngineConfig::from_lookup(&lookup).unwrap();
        assert_eq!(config.screening.top_assets, 200);
    }
}
