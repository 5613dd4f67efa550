use serde::{Deserialize, Serialize};
use std::fmt;

/// The two independently trained and cached forecasting pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastVariant {
    /// Ensemble predicting the next-bar percentage return (Variant A).
    PercentChange,
    /// Ensemble predicting the next-bar close price (Variant B).
    AbsolutePrice,
}

impl ForecastVariant {
    /// Suffix used in model cache keys.
    pub fn cache_tag(&self) -> &'static str {
        match self {
            ForecastVariant::PercentChange => "pct_change",
            ForecastVariant::AbsolutePrice => "abs_price",
        }
    }
}

impl fmt::Display for ForecastVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cache_tag())
    }
}

/// Which strategy of the fallback ladder produced a forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastSource {
    Cached,
    Ensemble,
    ReducedModel,
    /// No-signal default: last close scaled by a tiny positive multiplier.
    Degenerate,
    /// Last close repeated over the horizon.
    Flat,
}

/// Predicted price levels aligned with the most recent rows used for inference.
///
/// Both variants expose price levels; Variant A converts its percentage
/// predictions before returning.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Forecast {
    pub variant: ForecastVariant,
    pub source: ForecastSource,
    pub prices: Vec<f64>,
}

impl Forecast {
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn mean(&self) -> Option<f64> {
        if self.prices.is_empty() {
            return None;
        }
        Some(self.prices.iter().sum::<f64>() / self.prices.len() as f64)
    }

    /// Fractional change of the forecast mean relative to `reference`.
    pub fn change_from(&self, reference: f64) -> Option<f64> {
        if reference <= 0.0 {
            return None;
        }
        self.mean().map(|m| (m - reference) / reference)
    }
}
