use trendcast::application::indicators::{derive_extended_features, derive_primary_features};
use trendcast::application::patterns::detect_patterns;
use trendcast::domain::errors::EngineError;
use trendcast::domain::features::Feature;
use trendcast::domain::market::Bar;
use trendcast::infrastructure::mock::synthetic_bars;

#[test]
fn test_primary_frame_is_complete_and_bounded() {
    let bars = synthetic_bars(500, 100.0, 0.0005, 11);
    let frame = derive_primary_features(&bars).unwrap();

    assert!(!frame.is_empty());
    assert!(frame.len() < bars.len());
    for feature in frame.features() {
        let column = frame.column(feature).unwrap();
        assert_eq!(column.len(), frame.len(), "{:?} misaligned", feature);
        assert!(column.iter().all(|v| v.is_finite()), "{:?} has non-finite values", feature);
    }
    for feature in [Feature::Rsi, Feature::Adx, Feature::PlusDi, Feature::MinusDi] {
        let column = frame.column(feature).unwrap();
        assert!(column.iter().all(|v| (0.0..=100.0).contains(v)), "{:?} out of range", feature);
    }
}

#[test]
fn test_frame_rows_are_the_latest_bars() {
    let bars = synthetic_bars(300, 50.0, 0.0, 4);
    let frame = derive_extended_features(&bars).unwrap();
    assert_eq!(frame.bars().last(), bars.last());
    assert_eq!(frame.last_close(), bars.last().map(|b| b.close));
}

#[test]
fn test_unordered_bars_rejected() {
    let mut bars = synthetic_bars(60, 100.0, 0.0, 2);
    bars.swap(10, 11);
    assert!(matches!(
        derive_primary_features(&bars),
        Err(EngineError::InvalidInput(_))
    ));
}

#[test]
fn test_pattern_detector_on_short_input() {
    assert!(!detect_patterns(&[]).any_detected());
    let single = [Bar::new(0, 10.0, 12.0, 9.0, 10.0, 1.0)];
    assert!(!detect_patterns(&single).any_detected());
}
