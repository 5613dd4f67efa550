//! trendcast - crypto market screening, forecasting and backtesting CLI.
//!
//! Every command prints one JSON document to stdout. Logs go to stderr.
//!
//! # Usage
//! ```sh
//! cargo run -- screen --top-assets 50 --threshold 0.05
//! cargo run -- analyze --assets ETH,BTC --budget 250
//! cargo run -- backtest sol --lookback 30 --horizon 5
//! ```
//!
//! # Environment Variables
//! - `BINANCE_BASE_URL` - market data endpoint (default: https://api.binance.com)
//! - `NEWS_API_KEY` - NewsAPI key; empty disables sentiment
//! - `MODEL_CACHE_DIR` - model cache root (default: model_cache)

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{Level, info};
use tracing_subscriber::prelude::*;
use trendcast::application::backtest::{BacktestRequest, WalkForwardBacktester};
use trendcast::application::decision::{AnalysisRequest, TradingAnalyzer};
use trendcast::application::indicators::derive_primary_features;
use trendcast::application::ml::cross_validation::cross_validate_frame;
use trendcast::application::ml::{AbsolutePriceForecaster, ModelCache, PercentChangeForecaster};
use trendcast::application::screening::{Screener, ScreeningRequest};
use trendcast::config::EngineConfig;
use trendcast::domain::market::symbol::normalize_symbol;
use trendcast::domain::market::{Bar, Timeframe};
use trendcast::domain::ml::ForecastVariant;
use trendcast::domain::ml::feature_registry::PERCENT_CHANGE_CANDIDATES;
use trendcast::domain::ports::{MarketDataProvider, SentimentProvider};
use trendcast::infrastructure::{BinanceMarketData, CsvMarketData, FileModelStore, NewsApiSentiment};

/// Bars fetched for cross-validation.
const CROSS_VALIDATION_BARS: usize = 500;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Read bars from CSV files in this directory instead of Binance
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Screen listed assets for large forecast moves
    Screen {
        #[arg(long)]
        top_assets: Option<usize>,
        /// Minimum forecast change as a fraction (0.1 = 10%)
        #[arg(long)]
        threshold: Option<f64>,
        #[arg(long, default_value_t = false)]
        include_negative: bool,
        /// Disable the ADX/RSI/volume quality filter
        #[arg(long, default_value_t = false)]
        no_quality_filter: bool,
        #[arg(long)]
        workers: Option<usize>,
        /// Cross-validate freshly trained models and keep the scores in the cache metadata
        #[arg(long, default_value_t = false)]
        cross_validate: bool,
    },
    /// Trading decisions and budget allocation for a basket of assets
    Analyze {
        /// Comma separated symbols
        #[arg(short, long, default_value = "ETH/USDT,BTC/USDT")]
        assets: String,
        #[arg(short, long, default_value = "10.0")]
        budget: String,
        #[arg(long)]
        forecast_days: Option<usize>,
        #[arg(long)]
        news_limit: Option<usize>,
    },
    /// Walk-forward backtest of the percentage-change forecaster
    Backtest {
        symbol: String,
        #[arg(long, default_value_t = 30)]
        lookback: usize,
        #[arg(long, default_value_t = 5)]
        horizon: usize,
    },
    /// Walk-forward backtest of the absolute-price forecaster with pattern statistics
    BacktestExtended {
        symbol: String,
        #[arg(long, default_value_t = 30)]
        lookback: usize,
        #[arg(long, default_value_t = 5)]
        horizon: usize,
    },
    /// K-fold cross-validation, recorded in the model cache metadata
    CrossValidate {
        symbol: String,
        #[arg(short, long, default_value_t = 5)]
        k_folds: usize,
    },
    /// Historical bars with ISO-8601 timestamps
    History {
        #[arg(default_value = "BTC/USDT")]
        symbol: String,
        #[arg(short, long, default_value = "1d")]
        timeframe: String,
        #[arg(short, long, default_value_t = 30)]
        limit: usize,
        /// Also write the bars as CSV under this directory
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// Tradable assets for the configured quote currency
    Assets,
}

#[derive(Serialize)]
struct HistoricalBar {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl From<&Bar> for HistoricalBar {
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

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_assets(raw: &str, quote: &str) -> Result<Vec<String>> {
    raw.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| normalize_symbol(s, quote).map_err(anyhow::Error::from))
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stderr_layer)
        .init();

    let cli = Cli::parse();
    let config = EngineConfig::from_env()?;
    info!("trendcast {} starting", env!("CARGO_PKG_VERSION"));

    let market_data: Arc<dyn MarketDataProvider> = match &cli.data_dir {
        Some(dir) => {
            info!("Reading bars from {}", dir.display());
            Arc::new(CsvMarketData::new(dir))
        }
        None => Arc::new(BinanceMarketData::new(&config.market.binance_base_url)),
    };
    let store = FileModelStore::new(&config.forecast.model_cache_dir)?;
    let cache = Arc::new(ModelCache::new(Arc::new(store)).with_max_age(config.forecast.cache_max_age()));
    let quote = config.market.quote.clone();

    match cli.command {
        Commands::Screen {
            top_assets,
            threshold,
            include_negative,
            no_quality_filter,
            workers,
            cross_validate,
        } => {
            let request = ScreeningRequest {
                top_assets: top_assets.unwrap_or(config.screening.top_assets),
                forecast_threshold: threshold.unwrap_or(config.screening.forecast_threshold),
                include_negative,
                quality_filter: !no_quality_filter,
            };
            let forecaster = PercentChangeForecaster::new()
                .with_cache(cache)
                .with_cross_validation(cross_validate);
            let screener = Screener::new(
                market_data,
                forecaster,
                config.market.timeframe,
                config.market.limit,
                &quote,
            )
            .with_workers(workers.unwrap_or(config.screening.max_workers));
            let report = screener.screen(request).await?;
            print_json(&report)?;
        }
        Commands::Analyze {
            assets,
            budget,
            forecast_days,
            news_limit,
        } => {
            let total_budget = Decimal::from_str(budget.trim()).context("budget must be a decimal amount")?;
            let request = AnalysisRequest {
                assets: parse_assets(&assets, &quote)?,
                total_budget,
                forecast_days: forecast_days.unwrap_or(config.forecast.forecast_days),
                news_limit: news_limit.unwrap_or(config.forecast.news_limit),
            };
            let sentiment: Arc<dyn SentimentProvider> =
                Arc::new(NewsApiSentiment::new(config.forecast.news_api_key.clone()));
            let analyzer = TradingAnalyzer::new(
                market_data,
                sentiment,
                AbsolutePriceForecaster::new().with_cache(cache),
                config.risk.parameters,
                &quote,
            );
            let decisions = analyzer.analyze(&request).await?;
            print_json(&json!({ "decisions": decisions }))?;
        }
        Commands::Backtest {
            symbol,
            lookback,
            horizon,
        } => {
            let symbol = normalize_symbol(&symbol, &quote)?;
            let backtester = WalkForwardBacktester::new(market_data, config.market.limit);
            let request = BacktestRequest::new(ForecastVariant::PercentChange, lookback, horizon);
            print_json(&backtester.run(&symbol, request).await?)?;
        }
        Commands::BacktestExtended {
            symbol,
            lookback,
            horizon,
        } => {
            let symbol = normalize_symbol(&symbol, &quote)?;
            let backtester = WalkForwardBacktester::new(market_data, config.market.limit);
            let request = BacktestRequest::new(ForecastVariant::AbsolutePrice, lookback, horizon);
            print_json(&backtester.run(&symbol, request).await?)?;
        }
        Commands::CrossValidate { symbol, k_folds } => {
            let symbol = normalize_symbol(&symbol, &quote)?;
            let bars = market_data
                .fetch_bars(&symbol, Timeframe::OneHour, CROSS_VALIDATION_BARS)
                .await
                .with_context(|| format!("Insufficient data for validation of {}", symbol))?;
            let summary = tokio::task::spawn_blocking(move || {
                let frame = derive_primary_features(&bars)?;
                let features = frame.available(PERCENT_CHANGE_CANDIDATES);
                let summary = cross_validate_frame(&frame, &features, k_folds)?;
                Ok::<_, anyhow::Error>((summary, features))
            })
            .await??;
            let (summary, features) = summary;
            cache.record_cross_validation(&symbol, ForecastVariant::PercentChange, &summary, &features)?;
            print_json(&json!({ "symbol": symbol, "cv_results": summary }))?;
        }
        Commands::History {
            symbol,
            timeframe,
            limit,
            save,
        } => {
            let symbol = normalize_symbol(&symbol, &quote)?;
            let timeframe = Timeframe::from_str(&timeframe)?;
            let bars = market_data
                .fetch_bars(&symbol, timeframe, limit)
                .await
                .context("Could not fetch historical data")?;
            if let Some(dir) = save {
                CsvMarketData::new(dir).store(&symbol, timeframe, &bars)?;
            }
            let data: Vec<HistoricalBar> = bars.iter().map(HistoricalBar::from).collect();
            print_json(&json!({ "data": data }))?;
        }
        Commands::Assets => {
            let assets = market_data.list_assets(&quote).await;
            print_json(&json!({ "assets": assets }))?;
        }
    }

    Ok(())
}
