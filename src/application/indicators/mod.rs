//! Feature derivation: raw bars in, indicator-augmented [`FeatureFrame`] out.
//!
//! Two indicator sets exist. The primary set feeds the percentage-change
//! forecaster and screening; the extended set adds stochastic and money-flow
//! oscillators and names its Bollinger columns distinctly. Both are pure
//! functions of the bar slice.

pub mod momentum;
pub mod series;
pub mod trend;
pub mod volatility;
pub mod volume;

use crate::domain::errors::EngineError;
use crate::domain::features::{Feature, FeatureFrame};
use crate::domain::market::{Bar, validate_bars};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const RSI_PERIOD: usize = 14;
const MACD_FAST: usize = 12;
const MACD_SLOW: usize = 26;
const MACD_SIGNAL: usize = 9;
const ATR_PERIOD: usize = 14;
const VOLATILITY_PERIOD: usize = 14;
const ADX_PERIOD: usize = 14;
const MOMENTUM_PERIOD: usize = 10;
const BOLLINGER_WINDOW: usize = 20;
const BOLLINGER_K: f64 = 2.0;
const STOCHASTIC_PERIOD: usize = 14;
const STOCHASTIC_SMOOTH: usize = 3;
const CMF_PERIOD: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorSet {
    Primary,
    Extended,
}

/// Derives the requested indicator set.
///
/// Malformed bars are rejected with `InvalidInput`. If the full set cannot be
/// computed, or leaves no complete row, a reduced set is derived instead;
/// only when that fails too is an error returned.
pub fn derive_features(bars: &[Bar], set: IndicatorSet) -> Result<FeatureFrame, EngineError> {
    validate_bars(bars)?;

    let full = match set {
        IndicatorSet::Primary => primary_columns(bars),
        IndicatorSet::Extended => extended_columns(bars),
    }
    .and_then(|columns| non_empty(FeatureFrame::from_columns(bars, columns)?));

    match full {
        Ok(frame) => {
            debug!(
                "Derived {:?} indicators: {} bars -> {} rows, {} columns",
                set,
                bars.len(),
                frame.len(),
                frame.features().len()
            );
            Ok(frame)
        }
        Err(e) => {
            warn!("{:?} indicator derivation failed ({}), using reduced set", set, e);
            let reduced = match set {
                IndicatorSet::Primary => reduced_primary_columns(bars),
                IndicatorSet::Extended => reduced_extended_columns(bars),
            };
            FeatureFrame::from_columns(bars, reduced)
        }
    }
}

pub fn derive_primary_features(bars: &[Bar]) -> Result<FeatureFrame, EngineError> {
    derive_features(bars, IndicatorSet::Primary)
}

pub fn derive_extended_features(bars: &[Bar]) -> Result<FeatureFrame, EngineError> {
    derive_features(bars, IndicatorSet::Extended)
}

fn non_empty(frame: FeatureFrame) -> Result<FeatureFrame, EngineError> {
    if frame.is_empty() {
        return Err(EngineError::IndicatorComputation(
            "no complete rows after warm-up".to_string(),
        ));
    }
    Ok(frame)
}

struct Ohlcv {
    highs: Vec<f64>,
    lows: Vec<f64>,
    closes: Vec<f64>,
    volumes: Vec<f64>,
}

impl Ohlcv {
    fn from_bars(bars: &[Bar]) -> Self {
        Self {
            highs: bars.iter().map(|b| b.high).collect(),
            lows: bars.iter().map(|b| b.low).collect(),
            closes: bars.iter().map(|b| b.close).collect(),
            volumes: bars.iter().map(|b| b.volume).collect(),
        }
    }
}

/// Columns shared by both sets, Bollinger bands excluded.
fn core_columns(data: &Ohlcv) -> Vec<(Feature, Vec<f64>)> {
    let closes = &data.closes;

    let rsi = momentum::rsi(closes, RSI_PERIOD);
    let macd = momentum::macd(closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL);
    let atr = volatility::atr(&data.highs, &data.lows, closes, ATR_PERIOD);
    let natr = volatility::natr(&atr, closes);
    let dmi = trend::directional_index(&data.highs, &data.lows, closes, ADX_PERIOD);
    let ema_9 = trend::ema(closes, 9);
    let ema_21 = trend::ema(closes, 21);
    let ema_50 = trend::ema(closes, 50);
    let ema_200 = trend::ema(closes, 200);

    let rsi_change = series::diff(&rsi, 1);
    let price_to_ema50 = series::divide(closes, &ema_50);
    let ema_ratio = series::divide(&ema_9, &ema_21);
    let trend_change = trend::trend_change(closes, &ema_50);

    vec![
        (Feature::Rsi, rsi),
        (Feature::Macd, macd.macd),
        (Feature::SignalLine, macd.signal),
        (Feature::MacdHist, macd.histogram),
        (Feature::Atr, atr),
        (
            Feature::Volatility,
            volatility::log_return_volatility(closes, VOLATILITY_PERIOD),
        ),
        (Feature::Natr, natr),
        (Feature::Momentum, momentum::momentum(closes, MOMENTUM_PERIOD)),
        (
            Feature::RateOfChange,
            momentum::rate_of_change(closes, MOMENTUM_PERIOD),
        ),
        (Feature::Adx, dmi.adx),
        (Feature::PlusDi, dmi.plus_di),
        (Feature::MinusDi, dmi.minus_di),
        (Feature::Ema9, ema_9),
        (Feature::Ema21, ema_21),
        (Feature::Ema50, ema_50),
        (Feature::Ema200, ema_200),
        (Feature::Obv, volume::obv(closes, &data.volumes)),
        (Feature::TrendChange, trend_change),
        (Feature::RsiChange, rsi_change),
        (Feature::PriceToEma50, price_to_ema50),
        (Feature::EmaRatio, ema_ratio),
    ]
}

fn primary_columns(bars: &[Bar]) -> Result<Vec<(Feature, Vec<f64>)>, EngineError> {
    let data = Ohlcv::from_bars(bars);
    let mut columns = core_columns(&data);

    let bands = volatility::bollinger(&data.closes, BOLLINGER_WINDOW, BOLLINGER_K);
    columns.push((Feature::BbUpper, bands.upper));
    columns.push((Feature::BbLower, bands.lower));
    columns.push((Feature::BbMiddle, bands.middle));
    Ok(columns)
}

fn extended_columns(bars: &[Bar]) -> Result<Vec<(Feature, Vec<f64>)>, EngineError> {
    let data = Ohlcv::from_bars(bars);
    let mut columns = core_columns(&data);

    let bands = volatility::bollinger(&data.closes, BOLLINGER_WINDOW, BOLLINGER_K);
    let width = bands
        .upper
        .iter()
        .zip(&bands.lower)
        .zip(&data.closes)
        .map(|((u, l), c)| (u - l) / c)
        .collect();
    columns.push((Feature::BollingerUpper, bands.upper));
    columns.push((Feature::BollingerLower, bands.lower));
    columns.push((Feature::BollingerMiddle, bands.middle));
    columns.push((Feature::BbWidth, width));

    let stoch = momentum::stochastic(
        &data.highs,
        &data.lows,
        &data.closes,
        STOCHASTIC_PERIOD,
        STOCHASTIC_SMOOTH,
    )?;
    columns.push((Feature::StochasticK, stoch.k));
    columns.push((Feature::StochasticD, stoch.d));
    columns.push((
        Feature::Cmf,
        volume::chaikin_money_flow(&data.highs, &data.lows, &data.closes, &data.volumes, CMF_PERIOD),
    ));
    Ok(columns)
}

fn reduced_primary_columns(bars: &[Bar]) -> Vec<(Feature, Vec<f64>)> {
    let data = Ohlcv::from_bars(bars);
    let closes = &data.closes;
    let macd = momentum::macd(closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL);
    vec![
        (Feature::Rsi, momentum::rsi(closes, RSI_PERIOD)),
        (Feature::Macd, macd.macd),
        (Feature::SignalLine, macd.signal),
        (
            Feature::Atr,
            volatility::atr(&data.highs, &data.lows, closes, ATR_PERIOD),
        ),
        (
            Feature::Volatility,
            volatility::log_return_volatility(closes, VOLATILITY_PERIOD),
        ),
        (Feature::Ema50, trend::ema(closes, 50)),
        (Feature::Ema200, trend::ema(closes, 200)),
    ]
}

fn reduced_extended_columns(bars: &[Bar]) -> Vec<(Feature, Vec<f64>)> {
    let data = Ohlcv::from_bars(bars);
    let closes = &data.closes;
    let macd = momentum::macd(closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL);
    let dmi = trend::directional_index(&data.highs, &data.lows, closes, ADX_PERIOD);
    let bands = volatility::bollinger(closes, BOLLINGER_WINDOW, BOLLINGER_K);
    vec![
        (Feature::Rsi, momentum::rsi(closes, RSI_PERIOD)),
        (Feature::Ema9, trend::ema(closes, 9)),
        (Feature::Ema21, trend::ema(closes, 21)),
        (Feature::Macd, macd.macd),
        (Feature::SignalLine, macd.signal),
        (Feature::Adx, dmi.adx),
        (Feature::BollingerUpper, bands.upper),
        (Feature::BollingerLower, bands.lower),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic_bars(n: usize) -> Vec<Bar> {
        (0..n)
            .map(|i| {
                let t = i as f64;
                let close = 100.0 + t * 0.1 + (t * 0.5).sin() * 2.0;
                let open = close - (t * 0.9).cos();
                let high = close.max(open) + 0.8;
                let low = close.min(open) - 0.8;
                Bar::new(i as i64 * 3_600_000, open, high, low, close, 1_000.0 + (t * 0.3).sin() * 200.0)
            })
            .collect()
    }

    #[test]
    fn test_primary_frame_is_complete_and_shorter() {
        let bars = synthetic_bars(300);
        let frame = derive_primary_features(&bars).unwrap();
        assert!(frame.len() < bars.len());
        // ADX warm-up dominates: at least 2 * 14 - 1 rows
        assert!(frame.len() <= bars.len() - 27);
        assert!(frame.len() > 250);
        assert!(frame.has(Feature::BbUpper));
        assert!(!frame.has(Feature::Cmf));
        for feature in frame.features() {
            assert!(frame.column(feature).unwrap().iter().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn test_extended_frame_has_distinct_bollinger_names() {
        let bars = synthetic_bars(300);
        let frame = derive_extended_features(&bars).unwrap();
        assert!(frame.has(Feature::BollingerUpper));
        assert!(frame.has(Feature::StochasticD));
        assert!(frame.has(Feature::Cmf));
        assert!(!frame.has(Feature::BbUpper));
    }

    #[test]
    fn test_short_history_falls_back_to_reduced_set() {
        let bars = synthetic_bars(20);
        let frame = derive_primary_features(&bars).unwrap();
        assert!(!frame.is_empty());
        assert!(!frame.has(Feature::Adx));
        assert!(frame.has(Feature::Rsi));
        assert!(frame.has(Feature::Ema200));
    }

    #[test]
    fn test_unordered_bars_are_rejected() {
        let mut bars = synthetic_bars(50);
        bars.swap(10, 11);
        assert!(matches!(
            derive_primary_features(&bars),
            Err(EngineError::InvalidInput(_))
        ));
    }
}
