use super::series::{diff, ewm_mean, pct_change, rolling_max, rolling_mean, rolling_min, scale};
use crate::domain::errors::EngineError;

/// RSI from simple rolling means of gains and losses.
///
/// A window without losses reads 100; a window without any movement is
/// undefined.
pub fn rsi(closes: &[f64], period: usize) -> Vec<f64> {
    let delta = diff(closes, 1);
    let gains: Vec<f64> = delta.iter().map(|d| if d.is_nan() { *d } else { d.max(0.0) }).collect();
    let losses: Vec<f64> = delta.iter().map(|d| if d.is_nan() { *d } else { (-d).max(0.0) }).collect();

    rolling_mean(&gains, period)
        .into_iter()
        .zip(rolling_mean(&losses, period))
        .map(|(gain, loss)| 100.0 - 100.0 / (1.0 + gain / loss))
        .collect()
}

pub struct Macd {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

pub fn macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> Macd {
    let fast_ema = ewm_mean(closes, fast);
    let slow_ema = ewm_mean(closes, slow);
    let macd: Vec<f64> = fast_ema.iter().zip(&slow_ema).map(|(f, s)| f - s).collect();
    let signal = ewm_mean(&macd, signal);
    let histogram = macd.iter().zip(&signal).map(|(m, s)| m - s).collect();
    Macd {
        macd,
        signal,
        histogram,
    }
}

/// Absolute change over `period` bars.
pub fn momentum(closes: &[f64], period: usize) -> Vec<f64> {
    diff(closes, period)
}

/// Percentage change over `period` bars, in percent.
pub fn rate_of_change(closes: &[f64], period: usize) -> Vec<f64> {
    scale(&pct_change(closes, period), 100.0)
}

pub struct Stochastic {
    pub k: Vec<f64>,
    pub d: Vec<f64>,
}

/// %K over `period` bars of high/low range, %D as its `smooth`-bar mean.
pub fn stochastic(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    period: usize,
    smooth: usize,
) -> Result<Stochastic, EngineError> {
    let highest = rolling_max(highs, period)?;
    let lowest = rolling_min(lows, period)?;
    let k: Vec<f64> = closes
        .iter()
        .zip(highest.iter().zip(&lowest))
        .map(|(c, (h, l))| 100.0 * (c - l) / (h - l))
        .collect();
    let d = rolling_mean(&k, smooth);
    Ok(Stochastic { k, d })
}
