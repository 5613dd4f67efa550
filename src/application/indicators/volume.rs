use super::series::rolling_sum;

/// On-balance volume; the first bar contributes zero.
pub fn obv(closes: &[f64], volumes: &[f64]) -> Vec<f64> {
    let mut total = 0.0;
    closes
        .iter()
        .zip(volumes)
        .enumerate()
        .map(|(i, (close, volume))| {
            if i > 0 {
                let delta = close - closes[i - 1];
                if delta > 0.0 {
                    total += volume;
                } else if delta < 0.0 {
                    total -= volume;
                }
            }
            total
        })
        .collect()
}

/// Chaikin money flow over `period` bars. Zero-range bars are undefined.
pub fn chaikin_money_flow(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    volumes: &[f64],
    period: usize,
) -> Vec<f64> {
    let flow: Vec<f64> = (0..closes.len())
        .map(|i| {
            let (h, l, c) = (highs[i], lows[i], closes[i]);
            ((c - l) - (h - c)) / (h - l) * volumes[i]
        })
        .collect();

    rolling_sum(&flow, period)
        .into_iter()
        .zip(rolling_sum(volumes, period))
        .map(|(mf, vol)| mf / vol)
        .collect()
}
