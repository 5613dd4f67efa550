use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A named feature column of a [`FeatureFrame`](super::FeatureFrame).
///
/// The string names are persisted in model cache metadata, so they are part of
/// the on-disk format and must stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Feature {
    Rsi,
    Macd,
    SignalLine,
    MacdHist,
    Atr,
    Volatility,
    Natr,
    Momentum,
    RateOfChange,
    Adx,
    PlusDi,
    MinusDi,
    Ema9,
    Ema21,
    Ema50,
    Ema200,
    Obv,
    BbUpper,
    BbLower,
    BbMiddle,
    BollingerUpper,
    BollingerLower,
    BollingerMiddle,
    BbWidth,
    TrendChange,
    RsiChange,
    PriceToEma50,
    EmaRatio,
    StochasticK,
    StochasticD,
    Cmf,
}

impl Feature {
    pub const ALL: [Feature; 31] = [
        Feature::Rsi,
        Feature::Macd,
        Feature::SignalLine,
        Feature::MacdHist,
        Feature::Atr,
        Feature::Volatility,
        Feature::Natr,
        Feature::Momentum,
        Feature::RateOfChange,
        Feature::Adx,
        Feature::PlusDi,
        Feature::MinusDi,
        Feature::Ema9,
        Feature::Ema21,
        Feature::Ema50,
        Feature::Ema200,
        Feature::Obv,
        Feature::BbUpper,
        Feature::BbLower,
        Feature::BbMiddle,
        Feature::BollingerUpper,
        Feature::BollingerLower,
        Feature::BollingerMiddle,
        Feature::BbWidth,
        Feature::TrendChange,
        Feature::RsiChange,
        Feature::PriceToEma50,
        Feature::EmaRatio,
        Feature::StochasticK,
        Feature::StochasticD,
        Feature::Cmf,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::Rsi => "RSI",
            Feature::Macd => "MACD",
            Feature::SignalLine => "Signal_Line",
            Feature::MacdHist => "MACD_hist",
            Feature::Atr => "ATR",
            Feature::Volatility => "Volatility",
            Feature::Natr => "NATR",
            Feature::Momentum => "MOM",
            Feature::RateOfChange => "ROC",
            Feature::Adx => "ADX",
            Feature::PlusDi => "PLUS_DI",
            Feature::MinusDi => "MINUS_DI",
            Feature::Ema9 => "EMA_9",
            Feature::Ema21 => "EMA_21",
            Feature::Ema50 => "EMA_50",
            Feature::Ema200 => "EMA_200",
            Feature::Obv => "OBV",
            Feature::BbUpper => "BB_upper",
            Feature::BbLower => "BB_lower",
            Feature::BbMiddle => "BB_middle",
            Feature::BollingerUpper => "Bollinger_Upper",
            Feature::BollingerLower => "Bollinger_Lower",
            Feature::BollingerMiddle => "Bollinger_Middle",
            Feature::BbWidth => "BB_Width",
            Feature::TrendChange => "Trend_Change",
            Feature::RsiChange => "RSI_change",
            Feature::PriceToEma50 => "Price_to_EMA50",
            Feature::EmaRatio => "EMA_ratio",
            Feature::StochasticK => "Stochastic_K",
            Feature::StochasticD => "Stochastic_D",
            Feature::Cmf => "CMF",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Feature {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Feature::ALL
            .iter()
            .find(|f| f.as_str() == s)
            .copied()
            .ok_or_else(|| format!("Unknown feature column: {}", s))
    }
}

impl Serialize for Feature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Feature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Feature::from_str(&name).map_err(serde::de::Error::custom)
    }
}
