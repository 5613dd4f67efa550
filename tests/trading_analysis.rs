use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use trendcast::application::decision::{
    AnalysisRequest, RiskLevels, RiskParameters, SignalContext, TradingAnalyzer, decide,
};
use trendcast::application::ml::AbsolutePriceForecaster;
use trendcast::domain::market::Timeframe;
use trendcast::domain::trading::{DecisionLabel, TradeAction};
use trendcast::infrastructure::mock::{MockMarketDataProvider, MockSentimentProvider, synthetic_bars};

fn analyzer(provider: MockMarketDataProvider, sentiment: f64) -> TradingAnalyzer {
    TradingAnalyzer::new(
        Arc::new(provider),
        Arc::new(MockSentimentProvider::new(sentiment)),
        AbsolutePriceForecaster::new(),
        RiskParameters::default(),
        "USDT",
    )
}

#[tokio::test]
async fn test_basket_allocation_respects_budget() {
    let provider = MockMarketDataProvider::new()
        .with_bars("ETH/USDT", Timeframe::OneDay, synthetic_bars(200, 2000.0, 0.002, 1))
        .with_bars("BTC/USDT", Timeframe::OneDay, synthetic_bars(200, 40000.0, -0.001, 2));
    let request = AnalysisRequest {
        assets: vec!["ETH/USDT".to_string(), "BTC/USDT".to_string(), "NOPE/USDT".to_string()],
        total_budget: dec!(100),
        forecast_days: 7,
        news_limit: 10,
    };

    let records = analyzer(provider, 0.2).analyze(&request).await.unwrap();
    assert_eq!(records.len(), 2);

    let invested: Decimal = records.iter().map(|r| r.investment_amount).sum();
    assert!(invested <= dec!(100.02));
    let weights: f64 = records.iter().map(|r| r.weight_allocated).sum();
    assert!((weights - 1.0).abs() < 1e-9);
    for record in &records {
        assert!(record.quantity_to_buy >= Decimal::ZERO);
        assert_eq!(record.sentiment, 0.2);
        assert!(record.forecast_price.is_finite());
    }
}

#[tokio::test]
async fn test_zero_forecast_days_rejected() {
    let request = AnalysisRequest {
        assets: vec!["ETH/USDT".to_string()],
        total_budget: dec!(10),
        forecast_days: 0,
        news_limit: 10,
    };
    assert!(analyzer(MockMarketDataProvider::new(), 0.0).analyze(&request).await.is_err());
}

#[test]
fn test_first_matching_rule_wins() {
    let params = RiskParameters::default();
    let levels = RiskLevels::compute(100.0, Some(1.0), &params);

    // Strong forecast with a trend outranks the overbought reading.
    let ctx = SignalContext {
        forecast_gain: 0.08,
        adx: 30.0,
        rsi: 80.0,
        macd: -1.0,
        signal_line: 0.0,
        sentiment: 0.1,
        ..SignalContext::default()
    };
    let decision = decide(&ctx, 100.0, &levels, &params);
    assert_eq!(decision.label, DecisionLabel::BuyForecast);
    assert_eq!(decision.action, TradeAction::Buy);
    assert_eq!(decision.target, Some(levels.take_profit));

    let weak_trend = SignalContext { adx: 10.0, ..ctx };
    assert_eq!(decide(&weak_trend, 100.0, &levels, &params).label, DecisionLabel::SellOverbought);
}
