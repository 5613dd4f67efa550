//! Risk level configuration: static percentages and ATR scaling.

use super::{Lookup, parse_or, process_env};
use crate::application::decision::RiskParameters;
use anyhow::{Result, bail};

#[derive(Debug, Clone, Default)]
pub struct RiskEnvConfig {
    pub parameters: RiskParameters,
}

impl RiskEnvConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&process_env)
    }

    pub fn from_lookup(lookup: Lookup<'_>) -> Result<Self> {
        let defaults = RiskParameters::default();
        let parameters = RiskParameters {
            stop_loss_pct: parse_or(lookup, "DEFAULT_STOP_LOSS", defaults.stop_loss_pct)?,
            take_profit_pct: parse_or(lookup, "DEFAULT_TAKE_PROFIT", defaults.take_profit_pct)?,
            atr_multiplier: parse_or(lookup, "ATR_MULTIPLIER", defaults.atr_multiplier)?,
            risk_reward_ratio: parse_or(lookup, "RISK_REWARD_RATIO", defaults.risk_reward_ratio)?,
        };

        if parameters.stop_loss_pct >= 0.0 {
            bail!("DEFAULT_STOP_LOSS must be negative, got {}", parameters.stop_loss_pct);
        }
        if parameters.take_profit_pct <= 0.0 {
            bail!("DEFAULT_TAKE_PROFIT must be positive, got {}", parameters.take_profit_pct);
        }

        Ok(Self { parameters })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_support::lookup_from;

    #[test]
    fn test_risk_config_defaults() {
        let lookup = lookup_from(&[]);
        let config = RiskEnvConfig::from_lookup(&lookup).unwrap();
        assert_eq!(config.parameters, RiskParameters::default());
    }

    #[test]
    fn test_positive_stop_loss_rejected() {
        let lookup = lookup_from(&[("DEFAULT_STOP_LOSS", "0.03")]);
        assert!(RiskEnvConfig::from_lookup(&lookup).is_err());
    }
}
