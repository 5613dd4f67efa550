use super::sentiment_analyzer::SentimentAnalyzer;
use crate::domain::market::symbol::base_currency;
use crate::domain::ports::SentimentProvider;
use crate::infrastructure::core::http_client_factory::{HttpClientFactory, build_url_with_query};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{debug, warn};

pub const NEWS_API_URL: &str = "https://newsapi.org/v2/everything";

#[derive(Debug, Deserialize)]
struct Article {
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EverythingResponse {
    #[serde(default)]
    articles: Vec<Article>,
}

/// Mean headline polarity of recent NewsAPI articles about an asset's base
/// currency.
pub struct NewsApiSentiment {
    client: ClientWithMiddleware,
    api_key: String,
    endpoint: String,
    analyzer: SentimentAnalyzer,
}

impl NewsApiSentiment {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: HttpClientFactory::create_client(),
            api_key: api_key.into(),
            endpoint: NEWS_API_URL.to_string(),
            analyzer: SentimentAnalyzer::new(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    async fn headlines(&self, query: &str) -> Result<Vec<String>> {
        let url = build_url_with_query(
            &self.endpoint,
            &[("q", query), ("language", "en"), ("apiKey", self.api_key.as_str())],
        );
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to fetch news from NewsAPI")?;
        if !response.status().is_success() {
            anyhow::bail!("NewsAPI request failed with status {}", response.status());
        }

        let body: EverythingResponse = response.json().await.context("Failed to parse NewsAPI response")?;
        Ok(body.articles.into_iter().filter_map(|a| a.title).collect())
    }
}

#[async_trait]
impl SentimentProvider for NewsApiSentiment {
    async fn sentiment_score(&self, symbol: &str, article_limit: usize) -> f64 {
        if self.api_key.is_empty() || article_limit == 0 {
            return 0.0;
        }

        let query = base_currency(symbol);
        match self.headlines(query).await {
            Ok(headlines) => {
                let score = self
                    .analyzer
                    .mean_polarity(headlines.iter().take(article_limit).map(String::as_str));
                debug!("Sentiment for {} over {} headlines: {:.3}", symbol, headlines.len().min(article_limit), score);
                score
            }
            Err(e) => {
                warn!("Error fetching news for {}: {:#}", symbol, e);
                0.0
            }
        }
    }
}
