use super::patterns::PatternSet;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeAction {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "BUY (LONG)"),
            TradeAction::Sell => write!(f, "SELL (SHORT)"),
            TradeAction::Hold => write!(f, "HOLD OR MONITOR"),
        }
    }
}

/// Outcome of the decision ladder. One label per rule branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionLabel {
    BuyPatternConfirmed,
    BuyForecast,
    SellPatternConfirmed,
    SellForecast,
    SellOverbought,
    BuyOversold,
    BuyBullishDivergence,
    SellBearishDivergence,
    HoldNoClearSignal,
    Hold,
    HoldInsufficientData,
}

impl DecisionLabel {
    pub fn action(&self) -> TradeAction {
        match self {
            DecisionLabel::BuyPatternConfirmed
            | DecisionLabel::BuyForecast
            | DecisionLabel::BuyOversold
            | DecisionLabel::BuyBullishDivergence => TradeAction::Buy,
            DecisionLabel::SellPatternConfirmed
            | DecisionLabel::SellForecast
            | DecisionLabel::SellOverbought
            | DecisionLabel::SellBearishDivergence => TradeAction::Sell,
            DecisionLabel::HoldNoClearSignal
            | DecisionLabel::Hold
            | DecisionLabel::HoldInsufficientData => TradeAction::Hold,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            DecisionLabel::BuyPatternConfirmed => "positive forecast with pattern confirmation",
            DecisionLabel::BuyForecast => "positive forecast",
            DecisionLabel::SellPatternConfirmed => "loss forecast with pattern confirmation",
            DecisionLabel::SellForecast => "loss forecast",
            DecisionLabel::SellOverbought => "RSI overbought and MACD turning down",
            DecisionLabel::BuyOversold => "RSI oversold and MACD turning up",
            DecisionLabel::BuyBullishDivergence => "bullish RSI divergence",
            DecisionLabel::SellBearishDivergence => "bearish RSI divergence",
            DecisionLabel::HoldNoClearSignal => "no clear signal",
            DecisionLabel::Hold => "no signal to change position",
            DecisionLabel::HoldInsufficientData => "insufficient data for a decision",
        }
    }
}

/// Selected rule plus the price levels it quotes, if any.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub label: DecisionLabel,
    pub action: TradeAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<f64>,
}

impl Decision {
    pub fn new(label: DecisionLabel) -> Self {
        Self {
            label,
            action: label.action(),
            target: None,
            stop: None,
        }
    }

    pub fn with_levels(mut self, target: f64, stop: f64) -> Self {
        self.target = Some(target);
        self.stop = Some(stop);
        self
    }

    /// Human readable recommendation, quote currency appended to levels.
    pub fn message(&self, quote: &str) -> String {
        match (self.target, self.stop) {
            (Some(target), Some(stop)) => format!(
                "{}: {}. Target at {:.2} {}, Stop Loss at {:.2} {}",
                self.action,
                self.label.reason(),
                target,
                quote,
                stop,
                quote
            ),
            _ => format!("{}: {}.", self.action, self.label.reason()),
        }
    }
}

/// Latest indicator values the decision was taken on.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndicatorSnapshot {
    pub rsi: f64,
    pub macd: f64,
    pub signal_line: f64,
    pub adx: f64,
    pub atr: Option<f64>,
    pub ema_9: f64,
    pub ema_21: f64,
}

/// Advisory output for one asset of a basket. Not persisted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionRecord {
    pub asset: String,
    pub current_price: f64,
    pub forecast_price: f64,
    pub forecast_gain: f64,
    pub indicators: IndicatorSnapshot,
    pub sentiment: f64,
    /// Fraction of the budget, in [0, 1].
    pub weight_allocated: f64,
    #[serde(with = "rust_decimal::serde::float")]
    pub investment_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub quantity_to_buy: Decimal,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub decision: Decision,
    pub decision_text: String,
    pub pattern_detected: bool,
    pub patterns: PatternSet,
}
