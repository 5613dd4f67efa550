use crate::domain::market::Bar;
use crate::domain::trading::{CandlePattern, PatternSet};

const SMALL_FRACTION: f64 = 0.1;
const SHADOW_TO_BODY: f64 = 2.0;

/// Evaluates reversal shapes on the two most recent bars.
///
/// Fewer than two bars yields an empty set.
pub fn detect_patterns(bars: &[Bar]) -> PatternSet {
    let [.., prev, curr] = bars else {
        return PatternSet::new();
    };

    let body = curr.body();
    let range = curr.range();
    let upper_shadow = curr.high - curr.open.max(curr.close);
    let lower_shadow = curr.open.min(curr.close) - curr.low;
    let has_range = range > 0.0;

    let doji = has_range && body <= SMALL_FRACTION * range;
    let hammer =
        has_range && lower_shadow >= SHADOW_TO_BODY * body && upper_shadow <= SMALL_FRACTION * range;
    let shooting_star =
        has_range && upper_shadow >= SHADOW_TO_BODY * body && lower_shadow <= SMALL_FRACTION * range;

    let bullish_engulfing = prev.is_bearish()
        && curr.is_bullish()
        && curr.open < prev.close
        && curr.close > prev.open;
    let bearish_engulfing = prev.is_bullish()
        && curr.is_bearish()
        && curr.open > prev.close
        && curr.close < prev.open;

    [
        (CandlePattern::Doji, doji),
        (CandlePattern::Hammer, hammer),
        (CandlePattern::ShootingStar, shooting_star),
        (CandlePattern::BullishEngulfing, bullish_engulfing),
        (CandlePattern::BearishEngulfing, bearish_engulfing),
    ]
    .into_iter()
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(open: f64, high: f64, low: f64, close: f64) -> Bar {
        Bar::new(0, open, high, low, close, 1.0)
    }

    #[test]
    fn test_short_input_is_empty() {
        assert!(detect_patterns(&[]).is_empty());
        assert!(detect_patterns(&[bar(1.0, 2.0, 0.5, 1.5)]).is_empty());
    }

    #[test]
    fn test_all_patterns_reported() {
        let set = detect_patterns(&[bar(1.0, 2.0, 0.5, 1.5), bar(1.5, 2.0, 1.0, 1.6)]);
        assert_eq!(set.len(), CandlePattern::ALL.len());
    }

    #[test]
    fn test_doji() {
        let set = detect_patterns(&[bar(10.0, 11.0, 9.0, 10.5), bar(10.0, 11.0, 9.0, 10.05)]);
        assert!(set.is_detected(CandlePattern::Doji));
    }

    #[test]
    fn test_hammer_and_shooting_star() {
        // long lower shadow, close at the high
        let hammer = detect_patterns(&[bar(10.0, 10.5, 9.5, 10.0), bar(10.0, 10.5, 8.0, 10.5)]);
        assert!(hammer.is_detected(CandlePattern::Hammer));
        assert!(!hammer.is_detected(CandlePattern::ShootingStar));

        let star = detect_patterns(&[bar(10.0, 10.5, 9.5, 10.0), bar(10.5, 13.0, 10.0, 10.0)]);
        assert!(star.is_detected(CandlePattern::ShootingStar));
        assert!(!star.is_detected(CandlePattern::Hammer));
    }

    #[test]
    fn test_engulfing() {
        let bull = detect_patterns(&[bar(10.0, 10.2, 9.4, 9.5), bar(9.4, 10.6, 9.3, 10.5)]);
        assert!(bull.is_detected(CandlePattern::BullishEngulfing));
        assert!(!bull.is_detected(CandlePattern::BearishEngulfing));

        let bear = detect_patterns(&[bar(9.5, 10.1, 9.4, 10.0), bar(10.1, 10.2, 9.3, 9.4)]);
        assert!(bear.is_detected(CandlePattern::BearishEngulfing));
        assert!(!bear.is_detected(CandlePattern::BullishEngulfing));
    }

    #[test]
    fn test_zero_range_bar_matches_nothing() {
        let set = detect_patterns(&[bar(10.0, 10.0, 10.0, 10.0), bar(10.0, 10.0, 10.0, 10.0)]);
        assert!(!set.any_detected());
    }
}
