//! Offline bar source backed by CSV files, one per (symbol, timeframe):
//! `<dir>/<BASE>_<QUOTE>_<interval>.csv` with a
//! `timestamp,open,high,low,close,volume` header.

use crate::domain::market::symbol::to_storage_key;
use crate::domain::market::{Bar, Timeframe};
use crate::domain::ports::MarketDataProvider;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub fn read_bars(path: &Path) -> Result<Vec<Bar>> {
    let mut reader =
        csv::Reader::from_path(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut bars = Vec::new();
    for record in reader.deserialize() {
        let bar: Bar = record.with_context(|| format!("Malformed bar row in {}", path.display()))?;
        bars.push(bar);
    }
    Ok(bars)
}

pub fn write_bars(path: &Path, bars: &[Bar]) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("Failed to create {}", path.display()))?;
    for bar in bars {
        writer.serialize(bar)?;
    }
    writer.flush()?;
    Ok(())
}

pub struct CsvMarketData {
    dir: PathBuf,
}

impl CsvMarketData {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, symbol: &str, timeframe: Timeframe) -> PathBuf {
        self.dir
            .join(format!("{}_{}.csv", to_storage_key(symbol), timeframe.to_binance_string()))
    }

    /// Saves `bars` where `fetch_bars` will look for them.
    pub fn store(&self, symbol: &str, timeframe: Timeframe, bars: &[Bar]) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(symbol, timeframe);
        write_bars(&path, bars)?;
        info!("Wrote {} bars to {}", bars.len(), path.display());
        Ok(path)
    }
}

#[async_trait]
impl MarketDataProvider for CsvMarketData {
    async fn fetch_bars(&self, symbol: &str, timeframe: Timeframe, limit: usize) -> Option<Vec<Bar>> {
        let path = self.path_for(symbol, timeframe);
        match read_bars(&path) {
            Ok(bars) if !bars.is_empty() => {
                let start = bars.len().saturating_sub(limit);
                Some(bars[start..].to_vec())
            }
            Ok(_) => None,
            Err(e) => {
                warn!("No CSV data for {}: {:#}", symbol, e);
                None
            }
        }
    }

    /// Symbols with at least one CSV file for `quote`.
    async fn list_assets(&self, quote: &str) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        let suffix = format!("_{}", quote.to_uppercase());
        let mut assets: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name().into_string().ok()?;
                let stem = name.strip_suffix(".csv")?;
                let (pair, _interval) = stem.rsplit_once('_')?;
                let base = pair.strip_suffix(&suffix)?;
                Some(format!("{}/{}", base, quote.to_uppercase()))
            })
            .collect();
        assets.sort();
        assets.dedup();
        assets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_fetch_and_list() {
        let dir = std::env::temp_dir().join(format!("trendcast-csv-{}", std::process::id()));
        let source = CsvMarketData::new(&dir);
        let bars: Vec<Bar> = (0..10)
            .map(|i| Bar::new(i * 3_600_000, 1.0, 2.0, 0.5, 1.5, 10.0 + i as f64))
            .collect();
        source.store("ETH/USDT", Timeframe::OneHour, &bars).unwrap();

        let tail = source.fetch_bars("ETH/USDT", Timeframe::OneHour, 4).await.unwrap();
        assert_eq!(tail.len(), 4);
        assert_eq!(tail[0], bars[6]);
        assert!(source.fetch_bars("ETH/USDT", Timeframe::OneDay, 4).await.is_none());
        assert_eq!(source.list_assets("usdt").await, vec!["ETH/USDT".to_string()]);

        fs::remove_dir_all(&dir).ok();
    }
}
