use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskParameters {
    /// Static stop distance as a signed fraction of price (negative).
    pub stop_loss_pct: f64,
    /// Static take-profit distance as a fraction of price.
    pub take_profit_pct: f64,
    pub atr_multiplier: f64,
    pub risk_reward_ratio: f64,
}

impl Default for RiskParameters {
    fn default() -> Self {
        Self {
            stop_loss_pct: -0.03,
            take_profit_pct: 0.05,
            atr_multiplier: 2.0,
            risk_reward_ratio: 2.0,
        }
    }
}

/// Long-side protective levels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskLevels {
    pub stop_loss: f64,
    pub take_profit: f64,
}

impl RiskLevels {
    /// Tighter of the static percentage levels and the ATR levels, per side.
    /// Without an ATR only the static levels apply.
    pub fn compute(price: f64, atr: Option<f64>, params: &RiskParameters) -> Self {
        let static_stop = price * (1.0 + params.stop_loss_pct);
        let static_target = price * (1.0 + params.take_profit_pct);

        match atr.filter(|a| a.is_finite()) {
            Some(atr) => {
                let distance = atr * params.atr_multiplier;
                Self {
                    stop_loss: (price - distance).max(static_stop),
                    take_profit: (price + distance * params.risk_reward_ratio).min(static_target),
                }
            }
            None => Self {
                stop_loss: static_stop,
                take_profit: static_target,
            },
        }
    }

    /// Short-side (target, stop) quoted on sell decisions.
    pub fn short_levels(price: f64, params: &RiskParameters) -> (f64, f64) {
        (
            price * (1.0 - params.take_profit_pct),
            price * (1.0 - params.stop_loss_pct),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_levels_without_atr() {
        let levels = RiskLevels::compute(100.0, None, &RiskParameters::default());
        assert!((levels.stop_loss - 97.0).abs() < 1e-9);
        assert!((levels.take_profit - 105.0).abs() < 1e-9);
    }

    #[test]
    fn test_more_conservative_side_wins() {
        let params = RiskParameters::default();
        // Narrow ATR: dynamic stop 99, dynamic target 102.
        let narrow = RiskLevels::compute(100.0, Some(0.5), &params);
        assert!((narrow.stop_loss - 99.0).abs() < 1e-9);
        assert!((narrow.take_profit - 102.0).abs() < 1e-9);

        // Wide ATR: static levels are tighter.
        let wide = RiskLevels::compute(100.0, Some(10.0), &params);
        assert!((wide.stop_loss - 97.0).abs() < 1e-9);
        assert!((wide.take_profit - 105.0).abs() < 1e-9);
    }

    #[test]
    fn test_short_levels() {
        let (target, stop) = RiskLevels::short_levels(200.0, &RiskParameters::default());
        assert!((target - 190.0).abs() < 1e-9);
        assert!((stop - 206.0).abs() < 1e-9);
    }
}
