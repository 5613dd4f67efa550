use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Bar interval requested from the market data provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    OneMin,
    FiveMin,
    FifteenMin,
    OneHour,
    FourHour,
    OneDay,
}

impl Timeframe {
    /// Returns the duration of this timeframe in minutes
    pub fn to_minutes(&self) -> usize {
        match self {
            Timeframe::OneMin => 1,
            Timeframe::FiveMin => 5,
            Timeframe::FifteenMin => 15,
            Timeframe::OneHour => 60,
            Timeframe::FourHour => 240,
            Timeframe::OneDay => 1440,
        }
    }

    /// Returns the duration in milliseconds
    pub fn to_millis(&self) -> i64 {
        (self.to_minutes() * 60_000) as i64
    }

    /// Converts to Binance API interval string
    pub fn to_binance_string(&self) -> &'static str {
        match self {
            Timeframe::OneMin => "1m",
            Timeframe::FiveMin => "5m",
            Timeframe::FifteenMin => "15m",
            Timeframe::OneHour => "1h",
            Timeframe::FourHour => "4h",
            Timeframe::OneDay => "1d",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_binance_string())
    }
}

impl FromStr for Timeframe {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "1m" | "1min" => Ok(Timeframe::OneMin),
            "5m" | "5min" => Ok(Timeframe::FiveMin),
            "15m" | "15min" => Ok(Timeframe::FifteenMin),
            "1h" | "1hour" => Ok(Timeframe::OneHour),
            "4h" | "4hour" => Ok(Timeframe::FourHour),
            "1d" | "1day" => Ok(Timeframe::OneDay),
            _ => Err(anyhow!(
                "Invalid timeframe: {}. Valid options: 1m, 5m, 15m, 1h, 4h, 1d",
                s
            )),
        }
    }
}
