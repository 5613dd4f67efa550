//! First-match decision ladder.
//!
//! Rules are evaluated top-down and the first one that returns a label wins.
//! Keep `RULES` ordered by priority.

use super::risk_levels::{RiskLevels, RiskParameters};
use crate::domain::trading::{Decision, DecisionLabel, PatternSet};
use tracing::debug;

/// ADX above which a forecast is trusted as a trend.
pub const TREND_ADX: f64 = 25.0;
pub const RSI_OVERBOUGHT: f64 = 70.0;
pub const RSI_OVERSOLD: f64 = 30.0;
/// Forecast magnitude below which a hold carries no signal at all.
pub const NO_SIGNAL_GAIN: f64 = 0.01;

/// Latest values the ladder looks at for one asset.
#[derive(Debug, Clone, Default)]
pub struct SignalContext {
    pub forecast_gain: f64,
    pub adx: f64,
    pub rsi: f64,
    pub macd: f64,
    pub signal_line: f64,
    /// Up to the last three closes, oldest first.
    pub recent_closes: Vec<f64>,
    /// Up to the last two RSI values, oldest first.
    pub recent_rsi: Vec<f64>,
    pub sentiment: f64,
    pub patterns: PatternSet,
}

impl SignalContext {
    fn price_structure(&self) -> Option<([f64; 3], [f64; 2])> {
        let closes = self.recent_closes.len().checked_sub(3)?;
        let rsi = self.recent_rsi.len().checked_sub(2)?;
        Some((
            self.recent_closes[closes..].try_into().ok()?,
            self.recent_rsi[rsi..].try_into().ok()?,
        ))
    }
}

type Rule = fn(&SignalContext, &RiskParameters) -> Option<DecisionLabel>;

const RULES: &[(&str, Rule)] = &[
    ("strong_up_forecast", strong_up_forecast),
    ("strong_down_forecast", strong_down_forecast),
    ("overbought_reversal", overbought_reversal),
    ("oversold_reversal", oversold_reversal),
    ("insufficient_history", insufficient_history),
    ("rsi_divergence", rsi_divergence),
];

fn strong_up_forecast(ctx: &SignalContext, params: &RiskParameters) -> Option<DecisionLabel> {
    (ctx.forecast_gain > params.take_profit_pct && ctx.adx > TREND_ADX).then(|| {
        if ctx.patterns.confirms_long() {
            DecisionLabel::BuyPatternConfirmed
        } else {
            DecisionLabel::BuyForecast
        }
    })
}

fn strong_down_forecast(ctx: &SignalContext, params: &RiskParameters) -> Option<DecisionLabel> {
    (ctx.forecast_gain < params.stop_loss_pct && ctx.adx > TREND_ADX).then(|| {
        if ctx.patterns.confirms_short() {
            DecisionLabel::SellPatternConfirmed
        } else {
            DecisionLabel::SellForecast
        }
    })
}

fn overbought_reversal(ctx: &SignalContext, _: &RiskParameters) -> Option<DecisionLabel> {
    (ctx.rsi > RSI_OVERBOUGHT && ctx.macd < ctx.signal_line).then_some(DecisionLabel::SellOverbought)
}

fn oversold_reversal(ctx: &SignalContext, _: &RiskParameters) -> Option<DecisionLabel> {
    (ctx.rsi < RSI_OVERSOLD && ctx.macd > ctx.signal_line).then_some(DecisionLabel::BuyOversold)
}

fn insufficient_history(ctx: &SignalContext, _: &RiskParameters) -> Option<DecisionLabel> {
    ctx.price_structure()
        .is_none()
        .then_some(DecisionLabel::HoldInsufficientData)
}

fn rsi_divergence(ctx: &SignalContext, _: &RiskParameters) -> Option<DecisionLabel> {
    let ([c3, c2, c1], [r2, r1]) = ctx.price_structure()?;
    if c1 < c2 && c2 < c3 && r1 > r2 {
        Some(DecisionLabel::BuyBullishDivergence)
    } else if c1 > c2 && c2 > c3 && r1 < r2 {
        Some(DecisionLabel::SellBearishDivergence)
    } else {
        None
    }
}

fn hold(ctx: &SignalContext) -> DecisionLabel {
    if ctx.forecast_gain.abs() < NO_SIGNAL_GAIN || ctx.sentiment == 0.0 {
        DecisionLabel::HoldNoClearSignal
    } else {
        DecisionLabel::Hold
    }
}

/// Label of the first matching rule, or a hold.
pub fn select_label(ctx: &SignalContext, params: &RiskParameters) -> DecisionLabel {
    for (name, rule) in RULES {
        if let Some(label) = rule(ctx, params) {
            debug!("Decision rule {} fired: {:?}", name, label);
            return label;
        }
    }
    hold(ctx)
}

/// Runs the ladder and attaches the levels quoted with the chosen label.
pub fn decide(ctx: &SignalContext, price: f64, levels: &RiskLevels, params: &RiskParameters) -> Decision {
    let label = select_label(ctx, params);
    let decision = Decision::new(label);
    match label {
        DecisionLabel::BuyPatternConfirmed
        | DecisionLabel::BuyForecast
        | DecisionLabel::BuyOversold
        | DecisionLabel::BuyBullishDivergence => decision.with_levels(levels.take_profit, levels.stop_loss),
        DecisionLabel::SellPatternConfirmed | DecisionLabel::SellForecast | DecisionLabel::SellBearishDivergence => {
            let (target, stop) = RiskLevels::short_levels(price, params);
            decision.with_levels(target, stop)
        }
        DecisionLabel::SellOverbought
        | DecisionLabel::HoldNoClearSignal
        | DecisionLabel::Hold
        | DecisionLabel::HoldInsufficientData => decision,
    }
}
