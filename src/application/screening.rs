//! Basket screening: forecast every listed asset in parallel and keep the
//! ones whose predicted move clears the threshold.

use crate::application::indicators::derive_primary_features;
use crate::application::ml::PercentChangeForecaster;
use crate::domain::errors::EngineError;
use crate::domain::features::{Feature, FeatureFrame};
use crate::domain::market::Timeframe;
use crate::domain::ports::MarketDataProvider;
use crossbeam_channel::unbounded;
use serde::Serialize;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

const QUALITY_ADX: f64 = 20.0;
const QUALITY_RSI_LOW: f64 = 30.0;
const QUALITY_RSI_HIGH: f64 = 70.0;
const VOLUME_SURGE_RATIO: f64 = 1.2;
const RECENT_VOLUME_BARS: usize = 5;
/// Rows required before the volume surge check is attempted.
const MIN_VOLUME_ROWS: usize = 10;
const PROGRESS_EVERY: usize = 5;

/// Worker cap for the screening pool.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(8)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreeningRequest {
    pub top_assets: usize,
    /// Minimum forecast change, as a fraction.
    pub forecast_threshold: f64,
    pub include_negative: bool,
    pub quality_filter: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Trend {
    Positive,
    Negative,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityFlags {
    pub has_adx_trend: bool,
    pub has_rsi_signal: bool,
    pub has_volume_signal: bool,
}

impl QualityFlags {
    pub fn evaluate(frame: &FeatureFrame) -> Self {
        let has_adx_trend = frame.latest(Feature::Adx).is_some_and(|adx| adx > QUALITY_ADX);
        let has_rsi_signal = frame
            .latest(Feature::Rsi)
            .is_some_and(|rsi| rsi < QUALITY_RSI_LOW || rsi > QUALITY_RSI_HIGH);

        let volumes: Vec<f64> = frame.bars().iter().map(|b| b.volume).collect();
        let has_volume_signal = volumes.len() > MIN_VOLUME_ROWS && {
            let (history, recent) = volumes.split_at(volumes.len() - RECENT_VOLUME_BARS);
            mean(recent) > mean(history) * VOLUME_SURGE_RATIO
        };

        Self {
            has_adx_trend,
            has_rsi_signal,
            has_volume_signal,
        }
    }

    pub fn score(&self) -> usize {
        [self.has_adx_trend, self.has_rsi_signal, self.has_volume_signal]
            .into_iter()
            .filter(|flag| *flag)
            .count()
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenedAsset {
    pub symbol: String,
    pub current_price: f64,
    /// Forecast change in percent.
    pub forecast_change: f64,
    pub trend: Trend,
    pub rsi: Option<f64>,
    pub adx: Option<f64>,
    pub volume: f64,
    /// Latest NATR.
    pub volatility: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<usize>,
    #[serde(flatten)]
    pub quality: Option<QualityFlags>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreeningStats {
    pub positive: usize,
    pub negative: usize,
    pub high_quality: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScreeningReport {
    pub assets: Vec<ScreenedAsset>,
    pub stats: ScreeningStats,
}

impl ScreeningReport {
    /// Sorts by symbol so the report does not depend on completion order.
    pub fn from_assets(mut assets: Vec<ScreenedAsset>) -> Self {
        assets.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        let stats = ScreeningStats {
            positive: assets.iter().filter(|a| a.trend == Trend::Positive).count(),
            negative: assets.iter().filter(|a| a.trend == Trend::Negative).count(),
            high_quality: assets.iter().filter(|a| a.quality_score.unwrap_or(0) > 1).count(),
        };
        Self { assets, stats }
    }
}

/// Screens one asset's feature frame. `Ok(None)` means filtered out.
pub fn screen_frame(
    symbol: &str,
    frame: &FeatureFrame,
    forecaster: &PercentChangeForecaster,
    request: &ScreeningRequest,
) -> Result<Option<ScreenedAsset>, EngineError> {
    let Some(last) = frame.bars().last().copied() else {
        debug!("No indicators for {}", symbol);
        return Ok(None);
    };

    let quality = request.quality_filter.then(|| QualityFlags::evaluate(frame));
    if quality.is_some_and(|q| q.score() < 1) {
        debug!("Asset {} does not pass the quality filters", symbol);
        return Ok(None);
    }

    let forecast = forecaster.forecast(frame, Some(symbol))?;
    let Some(change) = forecast.change_from(last.close) else {
        return Ok(None);
    };
    let threshold = request.forecast_threshold;
    let included = change > threshold || (request.include_negative && change < -threshold);
    if !included {
        return Ok(None);
    }

    Ok(Some(ScreenedAsset {
        symbol: symbol.to_string(),
        current_price: round_to(last.close, 8),
        forecast_change: round_to(change * 100.0, 2),
        trend: if change > 0.0 { Trend::Positive } else { Trend::Negative },
        rsi: frame.latest(Feature::Rsi).map(|v| round_to(v, 2)),
        adx: frame.latest(Feature::Adx).map(|v| round_to(v, 2)),
        volume: round_to(last.volume, 2),
        volatility: frame.latest(Feature::Natr).map(|v| round_to(v, 2)),
        quality_score: quality.map(|q| q.score()),
        quality,
    }))
}

pub struct Screener {
    market_data: Arc<dyn MarketDataProvider>,
    forecaster: PercentChangeForecaster,
    timeframe: Timeframe,
    limit: usize,
    workers: usize,
    quote: String,
}

impl Screener {
    pub fn new(
        market_data: Arc<dyn MarketDataProvider>,
        forecaster: PercentChangeForecaster,
        timeframe: Timeframe,
        limit: usize,
        quote: impl Into<String>,
    ) -> Self {
        Self {
            market_data,
            forecaster,
            timeframe,
            limit,
            workers: default_workers(),
            quote: quote.into(),
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Lists up to `top_assets` symbols and screens them on a bounded pool.
    /// Per-asset failures are logged and skipped.
    pub async fn screen(&self, request: ScreeningRequest) -> Result<ScreeningReport, EngineError> {
        let mut assets = self.market_data.list_assets(&self.quote).await;
        assets.truncate(request.top_assets);
        info!("Screening {} assets with {} workers", assets.len(), self.workers);

        let total = assets.len();
        let handle = Handle::current();
        let market_data = self.market_data.clone();
        let forecaster = self.forecaster.clone();
        let (timeframe, limit, workers) = (self.timeframe, self.limit, self.workers);

        let screened = tokio::task::spawn_blocking(move || -> Result<Vec<ScreenedAsset>, EngineError> {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .build()
                .map_err(|e| EngineError::InvalidInput(format!("cannot build worker pool: {}", e)))?;
            let (tx, rx) = unbounded();

            for symbol in assets {
                let tx = tx.clone();
                let handle = handle.clone();
                let market_data = market_data.clone();
                let forecaster = forecaster.clone();
                pool.spawn(move || {
                    let result = handle
                        .block_on(market_data.fetch_bars(&symbol, timeframe, limit))
                        .filter(|bars| !bars.is_empty())
                        .ok_or_else(|| EngineError::data_unavailable(&symbol, "no bars returned"))
                        .and_then(|bars| derive_primary_features(&bars))
                        .and_then(|frame| screen_frame(&symbol, &frame, &forecaster, &request));
                    let _ = tx.send((symbol, result));
                });
            }
            drop(tx);

            let mut screened = Vec::new();
            for (done, (symbol, result)) in rx.iter().enumerate() {
                match result {
                    Ok(Some(asset)) => screened.push(asset),
                    Ok(None) => {}
                    Err(e) => warn!("Error analyzing {}: {}", symbol, e),
                }
                if (done + 1) % PROGRESS_EVERY == 0 || done + 1 == total {
                    info!("Processed {}/{} assets", done + 1, total);
                }
            }
            Ok(screened)
        })
        .await
        .map_err(|e| EngineError::ModelTraining(format!("screening task failed: {}", e)))??;

        info!("Screening returned {} assets", screened.len());
        Ok(ScreeningReport::from_assets(screened))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::Bar;

    fn frame(volumes: &[f64], rsi: f64, adx: f64) -> FeatureFrame {
        let bars: Vec<Bar> = volumes
            .iter()
            .enumerate()
            .map(|(i, v)| Bar::new(i as i64 * 60_000, 10.0, 11.0, 9.0, 10.0, *v))
            .collect();
        let n = bars.len();
        FeatureFrame::from_columns(
            &bars,
            vec![(Feature::Rsi, vec![rsi; n]), (Feature::Adx, vec![adx; n])],
        )
        .unwrap()
    }

    #[test]
    fn test_quality_flags() {
        let mut volumes = vec![100.0; 20];
        volumes.extend([200.0; 5]);
        let flags = QualityFlags::evaluate(&frame(&volumes, 75.0, 10.0));
        assert!(!flags.has_adx_trend);
        assert!(flags.has_rsi_signal);
        assert!(flags.has_volume_signal);
        assert_eq!(flags.score(), 2);

        let quiet = QualityFlags::evaluate(&frame(&[100.0; 8], 50.0, 25.0));
        assert!(quiet.has_adx_trend);
        assert!(!quiet.has_volume_signal);
        assert_eq!(quiet.score(), 1);
    }

    #[test]
    fn test_filtered_asset_skips_forecast() {
        let request = ScreeningRequest {
            top_assets: 10,
            forecast_threshold: 0.1,
            include_negative: false,
            quality_filter: true,
        };
        let result = screen_frame(
            "DOGE/USDT",
            &frame(&[100.0; 30], 50.0, 10.0),
            &PercentChangeForecaster::new(),
            &request,
        )
        .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_report_stats() {
        let asset = |symbol: &str, trend: Trend, score: usize| ScreenedAsset {
            symbol: symbol.to_string(),
            current_price: 1.0,
            forecast_change: 12.0,
            trend,
            rsi: None,
            adx: None,
            volume: 0.0,
            volatility: None,
            quality_score: Some(score),
            quality: None,
        };
        let report = ScreeningReport::from_assets(vec![
            asset("SOL/USDT", Trend::Negative, 1),
            asset("ADA/USDT", Trend::Positive, 2),
            asset("BTC/USDT", Trend::Positive, 3),
        ]);
        assert_eq!(report.assets[0].symbol, "ADA/USDT");
        assert_eq!(
            report.stats,
            ScreeningStats {
                positive: 2,
                negative: 1,
                high_quality: 2
            }
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_screen_skips_failing_assets_and_sorts() {
        use crate::infrastructure::mock::{MockMarketDataProvider, synthetic_bars};

        let provider = MockMarketDataProvider::new()
            .with_bars("XRP/USDT", Timeframe::OneHour, synthetic_bars(3, 0.5, 0.0, 4))
            .with_bars("BTC/USDT", Timeframe::OneHour, synthetic_bars(500, 100.0, 0.001, 21))
            .with_bars("ADA/USDT", Timeframe::OneHour, synthetic_bars(500, 50.0, 0.001, 21))
            .with_bars("ETH/BTC", Timeframe::OneHour, synthetic_bars(500, 0.05, 0.001, 21));
        let screener = Screener::new(
            Arc::new(provider),
            PercentChangeForecaster::new(),
            Timeframe::OneHour,
            500,
            "USDT",
        )
        .with_workers(2);
        let request = ScreeningRequest {
            top_assets: 10,
            forecast_threshold: 0.0,
            include_negative: true,
            quality_filter: false,
        };

        let report = screener.screen(request).await.unwrap();
        let symbols: Vec<&str> = report.assets.iter().map(|a| a.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["ADA/USDT", "BTC/USDT"]);
        assert_eq!(report.stats.positive + report.stats.negative, 2);
        assert!(report.assets.iter().all(|a| a.quality_score.is_none()));
    }
}
