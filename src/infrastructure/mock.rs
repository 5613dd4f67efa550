use crate::domain::market::{Bar, Timeframe};
use crate::domain::ports::{MarketDataProvider, ModelStore, SentimentProvider};
use anyhow::Result;
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::{Mutex, RwLock};
use tracing::debug;

/// In-memory bar source for tests and offline runs.
#[derive(Default)]
pub struct MockMarketDataProvider {
    bars: RwLock<HashMap<(String, Timeframe), Vec<Bar>>>,
}

impl MockMarketDataProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, symbol: &str, timeframe: Timeframe, bars: Vec<Bar>) {
        if let Ok(mut map) = self.bars.write() {
            map.insert((symbol.to_string(), timeframe), bars);
        }
    }

    pub fn with_bars(self, symbol: &str, timeframe: Timeframe, bars: Vec<Bar>) -> Self {
        self.insert(symbol, timeframe, bars);
        self
    }
}

#[async_trait]
impl MarketDataProvider for MockMarketDataProvider {
    async fn fetch_bars(&self, symbol: &str, timeframe: Timeframe, limit: usize) -> Option<Vec<Bar>> {
        let map = self.bars.read().ok()?;
        let bars = map.get(&(symbol.to_string(), timeframe))?;
        if bars.is_empty() {
            return None;
        }
        let start = bars.len().saturating_sub(limit);
        debug!("MockMarketDataProvider: serving {} bars for {}", bars.len() - start, symbol);
        Some(bars[start..].to_vec())
    }

    async fn list_assets(&self, quote: &str) -> Vec<String> {
        let Ok(map) = self.bars.read() else {
            return Vec::new();
        };
        let suffix = format!("/{}", quote.to_uppercase());
        let mut assets: Vec<String> = map
            .keys()
            .map(|(symbol, _)| symbol.clone())
            .filter(|symbol| symbol.ends_with(&suffix))
            .collect();
        assets.sort();
        assets.dedup();
        assets
    }
}

/// Returns the same score for every symbol.
pub struct MockSentimentProvider {
    score: f64,
}

impl MockSentimentProvider {
    pub fn new(score: f64) -> Self {
        Self { score }
    }
}

#[async_trait]
impl SentimentProvider for MockSentimentProvider {
    async fn sentiment_score(&self, _symbol: &str, _article_limit: usize) -> f64 {
        self.score
    }
}

#[derive(Default)]
pub struct InMemoryModelStore {
    models: Mutex<HashMap<String, Vec<u8>>>,
    metadata: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryModelStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn put(map: &Mutex<HashMap<String, Vec<u8>>>, key: &str, bytes: &[u8]) -> Result<()> {
        let mut guard = map
            .lock()
            .map_err(|_| anyhow::anyhow!("model store lock poisoned"))?;
        guard.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn get(map: &Mutex<HashMap<String, Vec<u8>>>, key: &str) -> Result<Option<Vec<u8>>> {
        let guard = map
            .lock()
            .map_err(|_| anyhow::anyhow!("model store lock poisoned"))?;
        Ok(guard.get(key).cloned())
    }
}

impl ModelStore for InMemoryModelStore {
    fn save_model(&self, key: &str, bytes: &[u8]) -> Result<()> {
        Self::put(&self.models, key, bytes)
    }

    fn load_model(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Self::get(&self.models, key)
    }

    fn save_metadata(&self, key: &str, bytes: &[u8]) -> Result<()> {
        Self::put(&self.metadata, key, bytes)
    }

    fn load_metadata(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Self::get(&self.metadata, key)
    }
}

/// Deterministic hourly random walk with `drift` per bar.
///
/// Same `seed` gives the same series. Every bar satisfies
/// `low <= min(open, close)`, `high >= max(open, close)` and has a
/// positive close and volume.
pub fn synthetic_bars(n: usize, start_price: f64, drift: f64, seed: u64) -> Vec<Bar> {
    let mut rng = StdRng::seed_from_u64(seed);
    let hour = Timeframe::OneHour.to_millis();
    let base_ts = 1_700_000_000_000i64;
    let mut price = start_price.max(0.01);

    (0..n)
        .map(|i| {
            let open = price;
            let shock: f64 = rng.random_range(-0.02..0.02);
            let close = (open * (1.0 + drift + shock)).max(0.01);
            let wick_up: f64 = rng.random_range(0.0..0.01);
            let wick_down: f64 = rng.random_range(0.0..0.01);
            let high = open.max(close) * (1.0 + wick_up);
            let low = open.min(close) * (1.0 - wick_down);
            let volume = rng.random_range(500.0..1500.0);
            price = close;
            Bar::new(base_ts + i as i64 * hour, open, high, low, close, volume)
        })
        .collect()
}
