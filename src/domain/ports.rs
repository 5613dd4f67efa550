use crate::domain::market::{Bar, Timeframe};
use anyhow::Result;
use async_trait::async_trait;

/// Source of historical bars and tradable symbols.
///
/// Implementations swallow transient failures: a failed fetch is `None`, a
/// failed listing is an empty vector. Nothing raises into the engine.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Up to `limit` most recent bars, oldest first.
    async fn fetch_bars(&self, symbol: &str, timeframe: Timeframe, limit: usize) -> Option<Vec<Bar>>;

    /// Symbols quoted in `quote`, formatted as `BASE/QUOTE`.
    async fn list_assets(&self, quote: &str) -> Vec<String>;
}

/// Headline sentiment lookup. Practically within [-1, 1]; 0.0 on any failure.
#[async_trait]
pub trait SentimentProvider: Send + Sync {
    async fn sentiment_score(&self, symbol: &str, article_limit: usize) -> f64;
}

/// Byte-oriented persistence for trained models and their metadata.
///
/// Keys are filesystem safe. Stores are partitioned by key; concurrent writers
/// to the same key are not coordinated and the last one wins.
pub trait ModelStore: Send + Sync {
    fn save_model(&self, key: &str, bytes: &[u8]) -> Result<()>;
    fn load_model(&self, key: &str) -> Result<Option<Vec<u8>>>;
    fn save_metadata(&self, key: &str, bytes: &[u8]) -> Result<()>;
    fn load_metadata(&self, key: &str) -> Result<Option<Vec<u8>>>;
}
