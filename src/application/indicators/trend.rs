use super::series::{ewm_mean, lag1, rolling_mean, rolling_sum};
use super::volatility::true_range;

pub fn ema(closes: &[f64], span: usize) -> Vec<f64> {
    ewm_mean(closes, span)
}

pub struct DirectionalIndex {
    pub adx: Vec<f64>,
    pub plus_di: Vec<f64>,
    pub minus_di: Vec<f64>,
}

/// +DI/-DI from `period`-bar rolling sums of directional movement and true
/// range, ADX as the `period`-bar rolling mean of DX.
///
/// Only the dominant move counts, and only when positive, so +DI plus -DI
/// never exceeds 100.
pub fn directional_index(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> DirectionalIndex {
    let tr = true_range(highs, lows, closes);
    let prev_high = lag1(highs);
    let prev_low = lag1(lows);

    let (plus_dm, minus_dm): (Vec<f64>, Vec<f64>) = (0..highs.len())
        .map(|i| {
            let up = highs[i] - prev_high[i];
            let down = prev_low[i] - lows[i];
            let plus = if up > down && up > 0.0 { up } else { 0.0 };
            let minus = if down > up && down > 0.0 { down } else { 0.0 };
            (plus, minus)
        })
        .unzip();

    let tr_sum = rolling_sum(&tr, period);
    let plus_di: Vec<f64> = rolling_sum(&plus_dm, period)
        .iter()
        .zip(&tr_sum)
        .map(|(dm, tr)| 100.0 * dm / tr)
        .collect();
    let minus_di: Vec<f64> = rolling_sum(&minus_dm, period)
        .iter()
        .zip(&tr_sum)
        .map(|(dm, tr)| 100.0 * dm / tr)
        .collect();

    let dx: Vec<f64> = plus_di
        .iter()
        .zip(&minus_di)
        .map(|(p, m)| 100.0 * (p - m).abs() / (p + m))
        .collect();

    DirectionalIndex {
        adx: rolling_mean(&dx, period),
        plus_di,
        minus_di,
    }
}

/// +1 when close crosses above `ema`, -1 when it crosses below, else 0.
pub fn trend_change(closes: &[f64], ema: &[f64]) -> Vec<f64> {
    let prev_close = lag1(closes);
    let prev_ema = lag1(ema);
    (0..closes.len())
        .map(|i| {
            let up = closes[i] > ema[i] && prev_close[i] <= prev_ema[i];
            let down = closes[i] < ema[i] && prev_close[i] >= prev_ema[i];
            f64::from(up as u8) - f64::from(down as u8)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wave(n: usize) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let closes: Vec<f64> = (0..n)
            .map(|i| 100.0 + i as f64 * 0.2 + (i as f64 * 0.7).sin() * 3.0)
            .collect();
        let highs = closes.iter().map(|c| c + 1.5).collect();
        let lows = closes.iter().map(|c| c - 1.5).collect();
        (highs, lows, closes)
    }

    #[test]
    fn test_directional_index_bounds_and_warmup() {
        let (h, l, c) = wave(80);
        let di = directional_index(&h, &l, &c, 14);
        // TR undefined on bar 0, first DI at 14, first ADX at 27
        assert!(di.plus_di[13].is_nan());
        assert!(!di.plus_di[14].is_nan());
        assert!(di.adx[26].is_nan());
        assert!(!di.adx[27].is_nan());

        for i in 27..80 {
            for v in [di.adx[i], di.plus_di[i], di.minus_di[i]] {
                assert!((0.0..=100.0).contains(&v), "value {} out of range", v);
            }
            assert!(di.plus_di[i] + di.minus_di[i] <= 100.0 + 1e-9);
        }
    }

    #[test]
    fn test_trend_change_cross() {
        let closes = [9.0, 11.0, 12.0, 9.0];
        let ema = [10.0, 10.0, 10.0, 10.0];
        assert_eq!(trend_change(&closes, &ema), vec![0.0, 1.0, 0.0, -1.0]);
    }
}
