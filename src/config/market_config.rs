//! Market data source configuration.

use super::{Lookup, parse_or, process_env};
use crate::domain::market::Timeframe;
use anyhow::Result;

pub const DEFAULT_BINANCE_BASE_URL: &str = "https://api.binance.com";

#[derive(Debug, Clone)]
pub struct MarketEnvConfig {
    /// Quote currency for listings and symbol normalization.
    pub quote: String,
    pub timeframe: Timeframe,
    /// Bars fetched for screening and as the backtest base window.
    pub limit: usize,
    pub binance_base_url: String,
}

impl Default for MarketEnvConfig {
    fn default() -> Self {
        Self {
            quote: "USDT".to_string(),
            timeframe: Timeframe::OneHour,
            limit: 500,
            binance_base_url: DEFAULT_BINANCE_BASE_URL.to_string(),
        }
    }
}

impl MarketEnvConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&process_env)
    }

    pub fn from_lookup(lookup: Lookup<'_>) -> Result<Self> {
        let defaults = Self::default();
        let timeframe = match lookup("DEFAULT_TIMEFRAME") {
            Some(raw) if !raw.trim().is_empty() => raw.trim().parse::<Timeframe>()?,
            _ => defaults.timeframe,
        };

        Ok(Self {
            quote: lookup("DEFAULT_MARKET_SYMBOL")
                .filter(|q| !q.trim().is_empty())
                .map(|q| q.trim().to_uppercase())
                .unwrap_or(defaults.quote),
            timeframe,
            limit: parse_or(lookup, "DEFAULT_LIMIT", defaults.limit)?,
            binance_base_url: lookup("BINANCE_BASE_URL")
                .filter(|u| !u.trim().is_empty())
                .unwrap_or(defaults.binance_base_url),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_support::lookup_from;

    #[test]
    fn test_market_overrides() {
        let lookup = lookup_from(&[
            ("DEFAULT_MARKET_SYMBOL", "btc"),
            ("DEFAULT_TIMEFRAME", "4h"),
            ("BINANCE_BASE_URL", "http://localhost:9000"),
        ]);
        let config = MarketEnvConfig::from_lookup(&lookup).unwrap();
        assert_eq!(config.quote, "BTC");
        assert_eq!(config.timeframe, Timeframe::FourHour);
        assert_eq!(config.binance_base_url, "http://localhost:9000");
    }

    #[test]
    fn test_bad_timeframe_is_error() {
        let lookup = lookup_from(&[("DEFAULT_TIMEFRAME", "3 weeks")]);
        assert!(MarketEnvConfig::from_lookup(&lookup).is_err());
    }
}
