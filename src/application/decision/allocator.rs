//! Two-phase basket allocation.
//!
//! Phase one turns each asset's signals into a non-negative weight; phase two
//! splits the budget proportionally and runs the decision ladder per asset.

use super::risk_levels::{RiskLevels, RiskParameters};
use super::rules::{SignalContext, TREND_ADX, decide};
use crate::domain::errors::EngineError;
use crate::domain::features::{Feature, FeatureFrame};
use crate::domain::ml::Forecast;
use crate::domain::trading::{CandlePattern, DecisionRecord, IndicatorSnapshot, PatternSet};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use tracing::{debug, info};

const MIN_WEIGHT: f64 = 0.001;
const MAX_ADX_FACTOR: f64 = 1.5;
const BULLISH_TREND_FACTOR: f64 = 1.2;
const BEARISH_TREND_FACTOR: f64 = 0.8;
const ENGULFING_BONUS: f64 = 0.2;
const REVERSAL_CANDLE_BONUS: f64 = 0.15;
const SENTIMENT_SCALE: f64 = 0.5;

/// Everything computed once per asset and reused by both phases.
#[derive(Debug, Clone)]
pub struct AssetSignals {
    pub symbol: String,
    pub current_price: f64,
    pub forecast_price: f64,
    pub forecast_gain: f64,
    pub indicators: IndicatorSnapshot,
    pub sentiment: f64,
    pub context: SignalContext,
}

impl AssetSignals {
    pub fn from_frame(
        symbol: &str,
        frame: &FeatureFrame,
        forecast: &Forecast,
        sentiment: f64,
        patterns: PatternSet,
    ) -> Result<Self, EngineError> {
        let current_price = frame
            .last_close()
            .ok_or_else(|| EngineError::data_unavailable(symbol, "empty feature frame"))?;
        let forecast_price = forecast
            .mean()
            .ok_or_else(|| EngineError::ModelTraining(format!("empty forecast for {}", symbol)))?;
        let latest = |feature: Feature| {
            frame.latest(feature).ok_or_else(|| {
                EngineError::IndicatorComputation(format!("{} missing for {}", feature, symbol))
            })
        };

        let indicators = IndicatorSnapshot {
            rsi: latest(Feature::Rsi)?,
            macd: latest(Feature::Macd)?,
            signal_line: latest(Feature::SignalLine)?,
            adx: latest(Feature::Adx)?,
            atr: frame.latest(Feature::Atr),
            ema_9: latest(Feature::Ema9)?,
            ema_21: latest(Feature::Ema21)?,
        };
        let tail = |values: Vec<f64>, n: usize| values[values.len().saturating_sub(n)..].to_vec();
        let forecast_gain = (forecast_price - current_price) / current_price;

        let context = SignalContext {
            forecast_gain,
            adx: indicators.adx,
            rsi: indicators.rsi,
            macd: indicators.macd,
            signal_line: indicators.signal_line,
            recent_closes: tail(frame.closes(), 3),
            recent_rsi: tail(frame.column(Feature::Rsi).unwrap_or_default().to_vec(), 2),
            sentiment,
            patterns,
        };

        Ok(Self {
            symbol: symbol.to_string(),
            current_price,
            forecast_price,
            forecast_gain,
            indicators,
            sentiment,
            context,
        })
    }

    pub fn patterns(&self) -> &PatternSet {
        &self.context.patterns
    }

    /// Phase-one weight, never below `MIN_WEIGHT`.
    pub fn weight(&self) -> f64 {
        let adx_factor = (self.indicators.adx / TREND_ADX).min(MAX_ADX_FACTOR);
        let trend_factor = if self.indicators.ema_9 > self.indicators.ema_21 {
            BULLISH_TREND_FACTOR
        } else {
            BEARISH_TREND_FACTOR
        };

        let gain = self.forecast_gain;
        let patterns = self.patterns();
        let bonus = |pattern: CandlePattern, bonus: f64, aligned: bool| {
            if aligned && patterns.is_detected(pattern) { bonus } else { 0.0 }
        };
        let pattern_bonus = bonus(CandlePattern::BullishEngulfing, ENGULFING_BONUS, gain > 0.0)
            + bonus(CandlePattern::Hammer, REVERSAL_CANDLE_BONUS, gain > 0.0)
            + bonus(CandlePattern::BearishEngulfing, ENGULFING_BONUS, gain < 0.0)
            + bonus(CandlePattern::ShootingStar, REVERSAL_CANDLE_BONUS, gain < 0.0);

        let weight = gain.abs() * adx_factor * trend_factor
            + (self.sentiment * SENTIMENT_SCALE).max(0.0)
            + pattern_bonus;
        weight.max(MIN_WEIGHT)
    }
}

/// Splits `budget` across `signals` by weight and decides per asset.
///
/// Records come back in input order.
pub fn allocate(
    signals: &[AssetSignals],
    budget: Decimal,
    params: &RiskParameters,
    quote: &str,
) -> Vec<DecisionRecord> {
    let weights: Vec<f64> = signals.iter().map(AssetSignals::weight).collect();
    let total: f64 = weights.iter().sum();
    info!(
        "Allocating {} {} across {} assets (total weight {:.4})",
        budget,
        quote,
        signals.len(),
        total
    );

    signals
        .iter()
        .zip(&weights)
        .map(|(asset, weight)| {
            let share = if total > 0.0 {
                weight / total
            } else {
                1.0 / signals.len() as f64
            };
            record(asset, share, budget, params, quote)
        })
        .collect()
}

fn record(
    asset: &AssetSignals,
    share: f64,
    budget: Decimal,
    params: &RiskParameters,
    quote: &str,
) -> DecisionRecord {
    let investment = (Decimal::from_f64(share).unwrap_or(Decimal::ZERO) * budget).round_dp(2);
    let quantity = match Decimal::from_f64(asset.current_price) {
        Some(price) if price > Decimal::ZERO => (investment / price).round_dp(8),
        _ => Decimal::ZERO,
    };

    let levels = RiskLevels::compute(asset.current_price, asset.indicators.atr, params);
    let decision = decide(&asset.context, asset.current_price, &levels, params);
    debug!("{}: {:?} with weight {:.4}", asset.symbol, decision.label, share);

    DecisionRecord {
        asset: asset.symbol.clone(),
        current_price: asset.current_price,
        forecast_price: asset.forecast_price,
        forecast_gain: asset.forecast_gain,
        indicators: asset.indicators.clone(),
        sentiment: asset.sentiment,
        weight_allocated: share,
        investment_amount: investment,
        quantity_to_buy: quantity,
        stop_loss: levels.stop_loss,
        take_profit: levels.take_profit,
        decision_text: decision.message(quote),
        decision,
        pattern_detected: asset.patterns().any_detected(),
        patterns: asset.patterns().clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trading::{DecisionLabel, TradeAction};
    use rust_decimal_macros::dec;

    fn signals(symbol: &str, price: f64, gain: f64, adx: f64, sentiment: f64) -> AssetSignals {
        let indicators = IndicatorSnapshot {
            rsi: 50.0,
            macd: 0.0,
            signal_line: 0.0,
            adx,
            atr: None,
            ema_9: price * 1.01,
            ema_21: price,
        };
        AssetSignals {
            symbol: symbol.to_string(),
            current_price: price,
            forecast_price: price * (1.0 + gain),
            forecast_gain: gain,
            context: SignalContext {
                forecast_gain: gain,
                adx,
                rsi: 50.0,
                recent_closes: vec![price, price, price],
                recent_rsi: vec![50.0, 50.0],
                sentiment,
                ..SignalContext::default()
            },
            indicators,
            sentiment,
        }
    }

    #[test]
    fn test_weight_components() {
        // |0.1| * min(50/25, 1.5) * 1.2 + 0.4 * 0.5
        let s = signals("BTC/USDT", 100.0, 0.10, 50.0, 0.4);
        assert!((s.weight() - (0.1 * 1.5 * 1.2 + 0.2)).abs() < 1e-12);

        let mut bullish = signals("ETH/USDT", 100.0, 0.02, 25.0, -1.0);
        bullish.context.patterns.set(CandlePattern::BullishEngulfing, true);
        bullish.context.patterns.set(CandlePattern::ShootingStar, true);
        assert!((bullish.weight() - (0.02 * 1.0 * 1.2 + 0.2)).abs() < 1e-12);

        let flat = signals("XRP/USDT", 1.0, 0.0, 10.0, 0.0);
        assert_eq!(flat.weight(), MIN_WEIGHT);
    }

    #[test]
    fn test_allocation_splits_budget() {
        let basket = vec![
            signals("BTC/USDT", 100.0, 0.10, 50.0, 0.0),
            signals("ETH/USDT", 50.0, 0.10, 50.0, 0.0),
        ];
        let records = allocate(&basket, dec!(100), &RiskParameters::default(), "USDT");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].asset, "BTC/USDT");
        assert!((records[0].weight_allocated - 0.5).abs() < 1e-12);
        assert_eq!(records[0].investment_amount, dec!(50));
        assert_eq!(records[0].quantity_to_buy, dec!(0.5));
        assert_eq!(records[1].quantity_to_buy, dec!(1));
        assert_eq!(records[0].decision.label, DecisionLabel::BuyForecast);
        assert_eq!(records[0].decision.action, TradeAction::Buy);
    }

    #[test]
    fn test_empty_basket() {
        assert!(allocate(&[], dec!(10), &RiskParameters::default(), "USDT").is_empty());
    }
}
