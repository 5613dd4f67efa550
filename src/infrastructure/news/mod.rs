pub mod news_api;
pub mod sentiment_analyzer;

pub use news_api::NewsApiSentiment;
pub use sentiment_analyzer::SentimentAnalyzer;
