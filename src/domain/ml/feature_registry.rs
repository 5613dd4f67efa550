//! Feature lists consumed by the forecasting pipelines.
//!
//! Order matters: training matrices are built column by column in list order,
//! and the same order is persisted with cached models.

use crate::domain::features::Feature;

/// Candidate columns for the percentage-change forecaster (Variant A).
pub const PERCENT_CHANGE_CANDIDATES: &[Feature] = &[
    Feature::Rsi,
    Feature::Macd,
    Feature::MacdHist,
    Feature::SignalLine,
    Feature::Atr,
    Feature::Volatility,
    Feature::Natr,
    Feature::Momentum,
    Feature::RateOfChange,
    Feature::Adx,
    Feature::PlusDi,
    Feature::MinusDi,
    Feature::Obv,
    Feature::BbUpper,
    Feature::BbLower,
    Feature::PriceToEma50,
    Feature::EmaRatio,
];

/// Reduced columns for the Variant A single-model fallback.
pub const PERCENT_CHANGE_FALLBACK: &[Feature] = &[
    Feature::Rsi,
    Feature::Macd,
    Feature::SignalLine,
    Feature::Atr,
    Feature::Volatility,
    Feature::Ema9,
    Feature::Ema21,
    Feature::Ema50,
    Feature::Ema200,
    Feature::Obv,
];

/// Candidate columns for the absolute-price forecaster (Variant B).
pub const ABSOLUTE_PRICE_CANDIDATES: &[Feature] = &[
    Feature::Rsi,
    Feature::Macd,
    Feature::MacdHist,
    Feature::SignalLine,
    Feature::Atr,
    Feature::Volatility,
    Feature::Natr,
    Feature::Momentum,
    Feature::RateOfChange,
    Feature::Adx,
    Feature::PlusDi,
    Feature::MinusDi,
    Feature::Obv,
    Feature::Ema9,
    Feature::Ema21,
    Feature::Ema50,
    Feature::Ema200,
    Feature::BollingerUpper,
    Feature::BollingerLower,
    Feature::BollingerMiddle,
    Feature::BbWidth,
    Feature::RsiChange,
    Feature::PriceToEma50,
    Feature::EmaRatio,
    Feature::TrendChange,
    Feature::StochasticK,
    Feature::StochasticD,
    Feature::Cmf,
];

/// Columns assumed for a cached Variant B model whose metadata lists none.
pub const ABSOLUTE_PRICE_DEFAULT: &[Feature] = &[
    Feature::Rsi,
    Feature::Macd,
    Feature::SignalLine,
    Feature::Atr,
    Feature::Ema9,
    Feature::Ema21,
    Feature::Adx,
    Feature::BollingerUpper,
    Feature::BollingerLower,
];

/// Reduced columns for the Variant B single-model fallback.
pub const ABSOLUTE_PRICE_FALLBACK: &[Feature] = &[
    Feature::Rsi,
    Feature::Ema9,
    Feature::Ema21,
    Feature::Macd,
    Feature::SignalLine,
    Feature::Adx,
];

/// The Variant B fallback refuses to train on fewer columns than this.
pub const ABSOLUTE_PRICE_FALLBACK_MIN_FEATURES: usize = 3;

/// Parses persisted column names, dropping any this build does not know.
pub fn parse_feature_names(names: &[String]) -> Vec<Feature> {
    names.iter().filter_map(|n| n.parse().ok()).collect()
}

pub fn feature_names(features: &[Feature]) -> Vec<String> {
    features.iter().map(|f| f.as_str().to_string()).collect()
}
