use crate::domain::errors::EngineError;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// One OHLCV sample at a fixed timeframe.
///
/// `timestamp` is the bar open time in Unix milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp).single()
    }

    fn is_finite(&self) -> bool {
        self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
            && self.volume.is_finite()
    }
}

/// Checks that a bar sequence is usable for feature derivation:
/// every value finite, close strictly positive, timestamps strictly ascending.
pub fn validate_bars(bars: &[Bar]) -> Result<(), EngineError> {
    for (i, bar) in bars.iter().enumerate() {
        if !bar.is_finite() {
            return Err(EngineError::InvalidInput(format!(
                "bar {} at {} has non-finite values",
                i, bar.timestamp
            )));
        }
        if bar.close <= 0.0 {
            return Err(EngineError::InvalidInput(format!(
                "bar {} at {} has non-positive close {}",
                i, bar.timestamp, bar.close
            )));
        }
    }

    if let Some(pos) = bars.windows(2).position(|w| w[1].timestamp <= w[0].timestamp) {
        return Err(EngineError::InvalidInput(format!(
            "timestamps not strictly ascending at index {}",
            pos + 1
        )));
    }

    Ok(())
}

/// Historical-data passthrough row with an ISO-8601 timestamp.
#[derive(Debug, Clone, Serialize)]
pub struct BarView {
    pub timestamp: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl From<&Bar> for BarView {
    fn from(bar: &Bar) -> Self {
        Self {
            timestamp: bar
                .datetime()
                .map(|dt| dt.to_rfc3339())
                .unwrap_or_else(|| bar.timestamp.to_string()),
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(ts: i64, close: f64) -> Bar {
        Bar::new(ts, close, close + 1.0, close - 1.0, close, 10.0)
    }

    #[test]
    fn test_validate_accepts_ascending_series() {
        let bars = vec![bar(1_000, 10.0), bar(2_000, 11.0), bar(3_000, 12.0)];
        assert!(validate_bars(&bars).is_ok());
    }

    #[test]
    fn test_validate_rejects_duplicate_timestamp() {
        let bars = vec![bar(1_000, 10.0), bar(1_000, 11.0)];
        let err = validate_bars(&bars).unwrap_err();
        assert!(err.to_string().contains("index 1"));
    }

    #[test]
    fn test_validate_rejects_nan_and_zero_close() {
        let mut nan_bar = bar(2_000, 11.0);
        nan_bar.high = f64::NAN;
        assert!(validate_bars(&[bar(1_000, 10.0), nan_bar]).is_err());
        assert!(validate_bars(&[bar(1_000, 0.0)]).is_err());
    }

    #[test]
    fn test_bar_view_formats_iso_timestamp() {
        let view = BarView::from(&bar(1_704_067_200_000, 42.0));
        assert!(view.timestamp.starts_with("2024-01-01T00:00:00"));
        assert_eq!(view.close, 42.0);
    }
}
