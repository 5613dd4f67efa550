//! Binance public REST market data: klines and exchange symbol listing.
//!
//! Requests are unauthenticated. Failures are logged and reported to the
//! engine as absent data.

use crate::domain::market::symbol::to_exchange_symbol;
use crate::domain::market::{Bar, Timeframe};
use crate::domain::ports::MarketDataProvider;
use crate::infrastructure::core::http_client_factory::{HttpClientFactory, build_url_with_query};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Largest page the klines endpoint serves.
const KLINES_PAGE_LIMIT: usize = 1000;
const ASSETS_CACHE_TTL: Duration = Duration::from_secs(3600);

pub struct BinanceMarketData {
    client: ClientWithMiddleware,
    base_url: String,
    assets_cache: RwLock<Option<(String, Vec<String>, Instant)>>,
}

impl BinanceMarketData {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: HttpClientFactory::create_client(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            assets_cache: RwLock::new(None),
        }
    }

    async fn klines_page(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
        end_time: Option<i64>,
    ) -> Result<Vec<Bar>> {
        let url = format!("{}/api/v3/klines", self.base_url);
        let api_symbol = to_exchange_symbol(symbol);
        let limit_str = limit.to_string();
        let mut params = vec![
            ("symbol", api_symbol),
            ("interval", timeframe.to_binance_string().to_string()),
            ("limit", limit_str),
        ];
        if let Some(end) = end_time {
            params.push(("endTime", end.to_string()));
        }

        let response = self
            .client
            .get(build_url_with_query(&url, &params))
            .send()
            .await
            .context("Failed to fetch klines from Binance")?;
        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Binance klines fetch failed: {}", error_text);
        }

        let klines: Vec<serde_json::Value> = response
            .json()
            .await
            .context("Failed to parse Binance klines response")?;
        Ok(klines.iter().filter_map(parse_kline).collect())
    }

    /// Walks backwards from now until `limit` bars are collected or history
    /// runs out.
    async fn fetch_all(&self, symbol: &str, timeframe: Timeframe, limit: usize) -> Result<Vec<Bar>> {
        let mut bars: Vec<Bar> = Vec::with_capacity(limit);
        let mut end_time = None;

        while bars.len() < limit {
            let page_size = (limit - bars.len()).min(KLINES_PAGE_LIMIT);
            let mut page = self.klines_page(symbol, timeframe, page_size, end_time).await?;
            let Some(first) = page.first() else {
                break;
            };
            end_time = Some(first.timestamp - 1);
            let exhausted = page.len() < page_size;
            page.append(&mut bars);
            bars = page;
            if exhausted {
                break;
            }
        }

        debug!("Binance: fetched {} {} bars for {}", bars.len(), timeframe, symbol);
        Ok(bars)
    }

    async fn fetch_assets(&self, quote: &str) -> Result<Vec<String>> {
        #[derive(Debug, Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct SymbolInfo {
            status: String,
            base_asset: String,
            quote_asset: String,
        }

        #[derive(Debug, Deserialize)]
        struct ExchangeInfo {
            symbols: Vec<SymbolInfo>,
        }

        let url = format!("{}/api/v3/exchangeInfo", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to fetch exchangeInfo from Binance")?;
        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Binance exchangeInfo fetch failed: {}", error_text);
        }

        let info: ExchangeInfo = response
            .json()
            .await
            .context("Failed to parse Binance exchangeInfo")?;
        Ok(info
            .symbols
            .into_iter()
            .filter(|s| s.status == "TRADING" && s.quote_asset.eq_ignore_ascii_case(quote))
            .map(|s| format!("{}/{}", s.base_asset, s.quote_asset))
            .collect())
    }

    fn cached_assets(&self, quote: &str) -> Option<Vec<String>> {
        let cache = self.assets_cache.read().ok()?;
        let (cached_quote, assets, at) = cache.as_ref()?;
        (cached_quote == quote && at.elapsed() < ASSETS_CACHE_TTL).then(|| assets.clone())
    }
}

/// `[openTime, "open", "high", "low", "close", "volume", ...]`
fn parse_kline(value: &serde_json::Value) -> Option<Bar> {
    let arr = value.as_array()?;
    if arr.len() < 6 {
        return None;
    }
    let field = |i: usize| arr[i].as_str()?.parse::<f64>().ok();
    Some(Bar::new(
        arr[0].as_i64()?,
        field(1)?,
        field(2)?,
        field(3)?,
        field(4)?,
        field(5)?,
    ))
}

#[async_trait]
impl MarketDataProvider for BinanceMarketData {
    async fn fetch_bars(&self, symbol: &str, timeframe: Timeframe, limit: usize) -> Option<Vec<Bar>> {
        match self.fetch_all(symbol, timeframe, limit).await {
            Ok(bars) if !bars.is_empty() => Some(bars),
            Ok(_) => {
                warn!("No data for {}", symbol);
                None
            }
            Err(e) => {
                warn!("Error fetching data for {}: {:#}", symbol, e);
                None
            }
        }
    }

    async fn list_assets(&self, quote: &str) -> Vec<String> {
        if let Some(assets) = self.cached_assets(quote) {
            return assets;
        }
        match self.fetch_assets(quote).await {
            Ok(assets) => {
                info!("Binance: found {} tradable {} pairs", assets.len(), quote);
                if let Ok(mut cache) = self.assets_cache.write() {
                    *cache = Some((quote.to_string(), assets.clone(), Instant::now()));
                }
                assets
            }
            Err(e) => {
                warn!("Error loading assets: {:#}", e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_kline() {
        let raw = json!([1_700_000_000_000i64, "100.5", "101.0", "99.0", "100.8", "1234.5", 1_700_003_599_999i64]);
        let bar = parse_kline(&raw).unwrap();
        assert_eq!(bar.timestamp, 1_700_000_000_000);
        assert_eq!(bar.open, 100.5);
        assert_eq!(bar.close, 100.8);
        assert_eq!(bar.volume, 1234.5);

        assert!(parse_kline(&json!([1, "2", "3"])).is_none());
        assert!(parse_kline(&json!([1, "x", "3", "4", "5", "6"])).is_none());
    }
}
