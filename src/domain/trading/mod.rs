// Candlestick patterns and advisory trade decisions
pub mod decision;
pub mod patterns;

pub use decision::{Decision, DecisionLabel, DecisionRecord, IndicatorSnapshot, TradeAction};
pub use patterns::{CandlePattern, PatternSet};
