//! Headline polarity scoring with VADER plus crypto-market keyword boosts.

use vader_sentiment::SentimentIntensityAnalyzer;

const BULLISH_KEYWORDS: &[(&str, f64)] = &[
    ("surge", 0.4),
    ("rally", 0.4),
    ("soar", 0.5),
    ("skyrocket", 0.6),
    ("bullish", 0.5),
    ("bull run", 0.5),
    ("all time high", 0.5),
    ("breakout", 0.3),
    ("adoption", 0.2),
    ("institutional", 0.2),
    ("partnership", 0.2),
    ("upgrade", 0.3),
    ("record high", 0.4),
    ("etf approval", 0.4),
];

const BEARISH_KEYWORDS: &[(&str, f64)] = &[
    ("crash", -0.5),
    ("plunge", -0.5),
    ("dump", -0.4),
    ("bearish", -0.5),
    ("collapse", -0.5),
    ("lawsuit", -0.4),
    ("ban", -0.4),
    ("hack", -0.5),
    ("breach", -0.4),
    ("stolen", -0.5),
    ("scam", -0.6),
    ("fraud", -0.5),
    ("selloff", -0.4),
    ("liquidation", -0.3),
    ("panic", -0.4),
];

/// Weight of the keyword boost relative to the VADER compound score.
const BOOST_WEIGHT: f64 = 0.5;

pub struct SentimentAnalyzer {
    analyzer: SentimentIntensityAnalyzer<'static>,
}

impl SentimentAnalyzer {
    pub fn new() -> Self {
        Self {
            analyzer: SentimentIntensityAnalyzer::new(),
        }
    }

    /// Keeps ASCII letters and whitespace only, as headline scoring expects.
    pub fn clean_headline(text: &str) -> String {
        text.chars()
            .filter(|c| c.is_ascii_alphabetic() || c.is_whitespace())
            .collect()
    }

    fn keyword_boost(text: &str) -> f64 {
        let lower = text.to_lowercase();
        BULLISH_KEYWORDS
            .iter()
            .chain(BEARISH_KEYWORDS)
            .filter(|(keyword, _)| lower.contains(keyword))
            .map(|(_, score)| score)
            .sum()
    }

    /// Polarity of a headline in [-1, 1]. Blank input scores 0.
    pub fn analyze(&self, headline: &str) -> f64 {
        let cleaned = Self::clean_headline(headline);
        if cleaned.trim().is_empty() {
            return 0.0;
        }

        let compound = self.analyzer.polarity_scores(&cleaned)["compound"];
        (compound + Self::keyword_boost(&cleaned) * BOOST_WEIGHT).clamp(-1.0, 1.0)
    }

    /// Mean polarity over the headlines; 0 when there are none.
    pub fn mean_polarity<'a>(&self, headlines: impl IntoIterator<Item = &'a str>) -> f64 {
        let (sum, count) = headlines
            .into_iter()
            .fold((0.0, 0usize), |(sum, count), h| (sum + self.analyze(h), count + 1));
        if count == 0 { 0.0 } else { sum / count as f64 }
    }
}

impl Default for SentimentAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_headline_strips_non_letters() {
        assert_eq!(SentimentAnalyzer::clean_headline("BTC +5%: rally!"), "BTC  rally");
    }

    #[test]
    fn test_polarity_direction() {
        let analyzer = SentimentAnalyzer::new();
        assert!(analyzer.analyze("Bitcoin rally continues as adoption soars") > 0.3);
        assert!(analyzer.analyze("Exchange hack triggers panic and crash") < -0.3);
        assert_eq!(analyzer.analyze("123 %%% 456"), 0.0);
    }

    #[test]
    fn test_mean_polarity_empty_is_zero() {
        let analyzer = SentimentAnalyzer::new();
        assert_eq!(analyzer.mean_polarity(Vec::<&str>::new()), 0.0);
        let score = analyzer.mean_polarity(["great gains", "terrible losses"]);
        assert!((-1.0..=1.0).contains(&score));
    }
}
