//! Column-wise series primitives shared by the indicator modules.
//!
//! Every function returns a new vector aligned with its input. Positions that
//! cannot be computed (look-back not yet filled, undefined input inside the
//! window) are `NaN`, so warm-up rows can be dropped in one place when the
//! feature frame is assembled.

use crate::domain::errors::EngineError;
use statrs::statistics::Statistics;
use ta::Next;
use ta::indicators::{Maximum, Minimum};

fn rolling(values: &[f64], window: usize, f: impl Fn(&[f64]) -> f64) -> Vec<f64> {
    if window == 0 {
        return vec![f64::NAN; values.len()];
    }
    (0..values.len())
        .map(|i| {
            if i + 1 < window {
                return f64::NAN;
            }
            let slice = &values[i + 1 - window..=i];
            if slice.iter().any(|v| v.is_nan()) {
                f64::NAN
            } else {
                f(slice)
            }
        })
        .collect()
}

/// Arithmetic mean over a full trailing window.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    rolling(values, window, |w| w.iter().sum::<f64>() / w.len() as f64)
}

pub fn rolling_sum(values: &[f64], window: usize) -> Vec<f64> {
    rolling(values, window, |w| w.iter().sum())
}

/// Sample standard deviation (n - 1 denominator) over a full trailing window.
pub fn rolling_std(values: &[f64], window: usize) -> Vec<f64> {
    rolling(values, window, |w| w.std_dev())
}

/// Trailing maximum. Input must be finite.
pub fn rolling_max(values: &[f64], window: usize) -> Result<Vec<f64>, EngineError> {
    let mut max = Maximum::new(window)
        .map_err(|e| EngineError::IndicatorComputation(format!("rolling max({}): {:?}", window, e)))?;
    Ok(mask_warmup(values.iter().map(|v| max.next(*v)).collect(), window))
}

/// Trailing minimum. Input must be finite.
pub fn rolling_min(values: &[f64], window: usize) -> Result<Vec<f64>, EngineError> {
    let mut min = Minimum::new(window)
        .map_err(|e| EngineError::IndicatorComputation(format!("rolling min({}): {:?}", window, e)))?;
    Ok(mask_warmup(values.iter().map(|v| min.next(*v)).collect(), window))
}

fn mask_warmup(mut values: Vec<f64>, window: usize) -> Vec<f64> {
    let warmup = window.saturating_sub(1).min(values.len());
    values[..warmup].fill(f64::NAN);
    values
}

/// Exponentially weighted mean with bias-adjusted weights, `alpha = 2 / (span + 1)`.
///
/// Weights are normalized by their running sum, so the first value equals the
/// first observation and no warm-up is produced. Undefined inputs decay the
/// existing weights without contributing.
pub fn ewm_mean(values: &[f64], span: usize) -> Vec<f64> {
    let alpha = 2.0 / (span as f64 + 1.0);
    let decay = 1.0 - alpha;
    let mut numerator = 0.0;
    let mut denominator = 0.0;

    values
        .iter()
        .map(|&x| {
            numerator *= decay;
            denominator *= decay;
            if !x.is_nan() {
                numerator += x;
                denominator += 1.0;
            }
            if denominator > 0.0 {
                numerator / denominator
            } else {
                f64::NAN
            }
        })
        .collect()
}

/// `values[i] - values[i - lag]`.
pub fn diff(values: &[f64], lag: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| {
            if i < lag {
                f64::NAN
            } else {
                values[i] - values[i - lag]
            }
        })
        .collect()
}

/// `values[i] / values[i - lag] - 1`.
pub fn pct_change(values: &[f64], lag: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| {
            if i < lag {
                f64::NAN
            } else {
                values[i] / values[i - lag] - 1.0
            }
        })
        .collect()
}

/// Previous value, `NaN` on the first row.
pub fn lag1(values: &[f64]) -> Vec<f64> {
    std::iter::once(f64::NAN)
        .chain(values.iter().copied())
        .take(values.len())
        .collect()
}

/// Element-wise `a / b`; division by zero yields a non-finite value.
pub fn divide(a: &[f64], b: &[f64]) -> Vec<f64> {
    a.iter().zip(b).map(|(x, y)| x / y).collect()
}

pub fn scale(values: &[f64], factor: f64) -> Vec<f64> {
    values.iter().map(|v| v * factor).collect()
}
