use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Single and double bar reversal shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandlePattern {
    Doji,
    Hammer,
    ShootingStar,
    BullishEngulfing,
    BearishEngulfing,
}

impl CandlePattern {
    pub const ALL: [CandlePattern; 5] = [
        CandlePattern::Doji,
        CandlePattern::Hammer,
        CandlePattern::ShootingStar,
        CandlePattern::BullishEngulfing,
        CandlePattern::BearishEngulfing,
    ];
}

impl fmt::Display for CandlePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CandlePattern::Doji => "doji",
            CandlePattern::Hammer => "hammer",
            CandlePattern::ShootingStar => "shooting_star",
            CandlePattern::BullishEngulfing => "bullish_engulfing",
            CandlePattern::BearishEngulfing => "bearish_engulfing",
        };
        f.write_str(name)
    }
}

/// Pattern name to detection flag. Empty when too few bars were supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatternSet(BTreeMap<CandlePattern, bool>);

impl PatternSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, pattern: CandlePattern, detected: bool) {
        self.0.insert(pattern, detected);
    }

    /// Absent patterns read as not detected.
    pub fn is_detected(&self, pattern: CandlePattern) -> bool {
        self.0.get(&pattern).copied().unwrap_or(false)
    }

    pub fn any_detected(&self) -> bool {
        self.0.values().any(|d| *d)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn detected(&self) -> impl Iterator<Item = CandlePattern> + '_ {
        self.0.iter().filter(|(_, d)| **d).map(|(p, _)| *p)
    }

    /// Bullish engulfing or hammer.
    pub fn confirms_long(&self) -> bool {
        self.is_detected(CandlePattern::BullishEngulfing) || self.is_detected(CandlePattern::Hammer)
    }

    /// Bearish engulfing or shooting star.
    pub fn confirms_short(&self) -> bool {
        self.is_detected(CandlePattern::BearishEngulfing)
            || self.is_detected(CandlePattern::ShootingStar)
    }
}

impl FromIterator<(CandlePattern, bool)> for PatternSet {
    fn from_iter<I: IntoIterator<Item = (CandlePattern, bool)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_snake_case_map() {
        let set: PatternSet = [
            (CandlePattern::BullishEngulfing, true),
            (CandlePattern::Doji, false),
        ]
        .into_iter()
        .collect();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"{"doji":false,"bullish_engulfing":true}"#);
    }

    #[test]
    fn test_confirmations() {
        let mut set = PatternSet::new();
        assert!(!set.any_detected());
        set.set(CandlePattern::Hammer, true);
        assert!(set.confirms_long());
        assert!(!set.confirms_short());
        set.set(CandlePattern::ShootingStar, true);
        assert!(set.confirms_short());
        assert_eq!(
            set.detected().collect::<Vec<_>>(),
            vec![CandlePattern::Hammer, CandlePattern::ShootingStar]
        );
    }
}
