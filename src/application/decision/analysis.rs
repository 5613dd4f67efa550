use super::allocator::{AssetSignals, allocate};
use super::risk_levels::RiskParameters;
use crate::application::indicators::derive_extended_features;
use crate::application::ml::AbsolutePriceForecaster;
use crate::application::patterns::detect_patterns;
use crate::domain::errors::EngineError;
use crate::domain::market::Timeframe;
use crate::domain::ports::{MarketDataProvider, SentimentProvider};
use crate::domain::trading::DecisionRecord;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};

/// Daily bars fetched per asset for trading analysis.
pub const ANALYSIS_BARS: usize = 200;

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub assets: Vec<String>,
    pub total_budget: Decimal,
    pub forecast_days: usize,
    pub news_limit: usize,
}

/// Basket trading analysis: forecast, score and size every asset.
pub struct TradingAnalyzer {
    market_data: Arc<dyn MarketDataProvider>,
    sentiment: Arc<dyn SentimentProvider>,
    forecaster: AbsolutePriceForecaster,
    risk: RiskParameters,
    quote: String,
}

impl TradingAnalyzer {
    pub fn new(
        market_data: Arc<dyn MarketDataProvider>,
        sentiment: Arc<dyn SentimentProvider>,
        forecaster: AbsolutePriceForecaster,
        risk: RiskParameters,
        quote: impl Into<String>,
    ) -> Self {
        Self {
            market_data,
            sentiment,
            forecaster,
            risk,
            quote: quote.into(),
        }
    }

    /// Assets that fail any step are logged and left out of the result.
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<Vec<DecisionRecord>, EngineError> {
        if request.forecast_days == 0 {
            return Err(EngineError::InvalidInput("forecast_days must be positive".to_string()));
        }

        let mut signals = Vec::with_capacity(request.assets.len());
        for symbol in &request.assets {
            match self.signals_for(symbol, request).await {
                Ok(asset) => signals.push(asset),
                Err(e) => warn!("Error analyzing {}: {}", symbol, e),
            }
        }
        info!(
            "Trading analysis: {} of {} assets produced signals",
            signals.len(),
            request.assets.len()
        );

        Ok(allocate(&signals, request.total_budget, &self.risk, &self.quote))
    }

    async fn signals_for(&self, symbol: &str, request: &AnalysisRequest) -> Result<AssetSignals, EngineError> {
        let bars = self
            .market_data
            .fetch_bars(symbol, Timeframe::OneDay, ANALYSIS_BARS)
            .await
            .filter(|bars| !bars.is_empty())
            .ok_or_else(|| EngineError::data_unavailable(symbol, "no daily bars"))?;

        let forecaster = self.forecaster.clone();
        let horizon = request.forecast_days;
        let owned_symbol = symbol.to_string();
        let (frame, forecast) = tokio::task::spawn_blocking(move || {
            let frame = derive_extended_features(&bars)?;
            let forecast = forecaster.forecast(&frame, horizon, Some(&owned_symbol))?;
            Ok::<_, EngineError>((frame, forecast))
        })
        .await
        .map_err(|e| EngineError::ModelTraining(format!("forecast task failed: {}", e)))??;

        let sentiment = self.sentiment.sentiment_score(symbol, request.news_limit).await;
        let patterns = detect_patterns(frame.bars());
        AssetSignals::from_frame(symbol, &frame, &forecast, sentiment, patterns)
    }
}
