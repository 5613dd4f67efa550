use super::series::{lag1, rolling_mean, rolling_std};

/// True range per bar. Undefined on the first bar (no previous close).
pub fn true_range(highs: &[f64], lows: &[f64], closes: &[f64]) -> Vec<f64> {
    let prev_close = lag1(closes);
    highs
        .iter()
        .zip(lows)
        .zip(&prev_close)
        .map(|((h, l), pc)| {
            if pc.is_nan() {
                f64::NAN
            } else {
                (h - l).max((h - pc).abs()).max((l - pc).abs())
            }
        })
        .collect()
}

/// Simple rolling mean of true range.
pub fn atr(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> Vec<f64> {
    rolling_mean(&true_range(highs, lows, closes), period)
}

/// ATR as a percentage of close.
pub fn natr(atr: &[f64], closes: &[f64]) -> Vec<f64> {
    atr.iter().zip(closes).map(|(a, c)| a / c * 100.0).collect()
}

/// Rolling sample standard deviation of log returns.
pub fn log_return_volatility(closes: &[f64], period: usize) -> Vec<f64> {
    let prev = lag1(closes);
    let returns: Vec<f64> = closes.iter().zip(&prev).map(|(c, p)| (c / p).ln()).collect();
    rolling_std(&returns, period)
}

pub struct Bollinger {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

/// SMA(`window`) +/- `k` sample standard deviations.
pub fn bollinger(closes: &[f64], window: usize, k: f64) -> Bollinger {
    let middle = rolling_mean(closes, window);
    let std = rolling_std(closes, window);
    let upper = middle.iter().zip(&std).map(|(m, s)| m + k * s).collect();
    let lower = middle.iter().zip(&std).map(|(m, s)| m - k * s).collect();
    Bollinger {
        upper,
        middle,
        lower,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_true_range_uses_previous_close() {
        let tr = true_range(&[10.0, 12.0], &[9.0, 11.5], &[9.5, 12.0]);
        assert!(tr[0].is_nan());
        // gap up: |12 - 9.5| beats 12 - 11.5
        assert!((tr[1] - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_atr_warmup() {
        let highs = vec![11.0; 20];
        let lows = vec![9.0; 20];
        let closes = vec![10.0; 20];
        let out = atr(&highs, &lows, &closes, 14);
        assert!(out[13].is_nan());
        assert!((out[14] - 2.0).abs() < 1e-12);
        assert!((natr(&out, &closes)[14] - 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_bollinger_symmetry() {
        let closes: Vec<f64> = (0..25).map(|i| 100.0 + (i % 3) as f64).collect();
        let b = bollinger(&closes, 20, 2.0);
        assert!(b.middle[18].is_nan());
        let i = 24;
        assert!(((b.upper[i] - b.middle[i]) - (b.middle[i] - b.lower[i])).abs() < 1e-9);
        assert!(b.upper[i] > b.lower[i]);
    }

    #[test]
    fn test_volatility_of_constant_growth_is_zero() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 * 1.01f64.powi(i)).collect();
        let vol = log_return_volatility(&closes, 14);
        assert!(vol[13].is_nan());
        assert!(vol[14].abs() < 1e-9);
    }
}
