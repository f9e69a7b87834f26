//! News search API client

use super::NewsSource;
use crate::config::AnalystConfig;
use crate::error::{AnalystError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

const NEWS_API_BASE: &str = "https://newsapi.org/v2";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// A news article about a company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub source: String,
    pub published_at: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub url: String,
}

/// Text handed to the qualitative analyst
///
/// An empty list renders as an explicit "no news" line so the analyst still
/// has something to reason about.
pub fn render_articles(company_name: &str, articles: &[NewsArticle]) -> String {
    if articles.is_empty() {
        return format!("No recent news articles were found for {company_name}.");
    }

    let mut out = String::new();
    for (i, article) in articles.iter().enumerate() {
        let date = article
            .published_at
            .map_or_else(|| "undated".to_string(), |d| d.format("%Y-%m-%d").to_string());
        let _ = writeln!(out, "{}. {} ({}, {date})", i + 1, article.title, article.source);
        if let Some(description) = article.description.as_deref().filter(|d| !d.trim().is_empty()) {
            let _ = writeln!(out, "   {}", description.trim());
        }
    }
    out
}

/// Client for a NewsAPI-style `everything` search endpoint
pub struct NewsApiSource {
    client: Client,
    api_key: String,
    api_base: String,
    page_size: u32,
    rate_limiter: SharedRateLimiter,
}

impl NewsApiSource {
    /// Create a new client with rate limiting
    ///
    /// # Arguments
    /// * `api_key` - News API key
    /// * `page_size` - Articles requested per company
    /// * `rate_limit` - Requests per minute
    pub fn new(api_key: impl Into<String>, page_size: u32, rate_limit: u32) -> Result<Self> {
        let per_minute = NonZeroU32::new(rate_limit).ok_or_else(|| {
            AnalystError::ConfigError("news rate limit must be greater than 0".to_string())
        })?;
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            api_base: NEWS_API_BASE.to_string(),
            page_size,
            rate_limiter: Arc::new(RateLimiter::direct(Quota::per_minute(per_minute))),
        })
    }

    /// Create from the analyst configuration; requires `news_api_key`
    pub fn from_config(config: &AnalystConfig) -> Result<Self> {
        let api_key = config.news_api_key.clone().ok_or_else(|| {
            AnalystError::ConfigError("NEWS_API_KEY is not set".to_string())
        })?;
        Self::new(api_key, config.news_page_size, config.news_rate_limit)
    }

    /// Point the client at a different API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }
}

#[async_trait]
impl NewsSource for NewsApiSource {
    #[instrument(skip(self))]
    async fn articles(&self, company_name: &str) -> Result<Vec<NewsArticle>> {
        self.rate_limiter.until_ready().await;

        let page_size = self.page_size.to_string();
        let response = self
            .client
            .get(format!("{}/everything", self.api_base))
            .header("X-Api-Key", &self.api_key)
            .query(&[
                ("q", company_name),
                ("sortBy", "publishedAt"),
                ("language", "en"),
                ("pageSize", page_size.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AnalystError::ApiError(format!("News request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AnalystError::ApiError(format!("News API error {status}: {body}")));
        }

        let payload: NewsApiResponse = response
            .json()
            .await
            .map_err(|e| AnalystError::ApiError(format!("Failed to parse news response: {e}")))?;

        if payload.status != "ok" {
            return Err(AnalystError::ApiError(format!(
                "News API returned status '{}': {}",
                payload.status,
                payload.message.unwrap_or_default()
            )));
        }

        let articles: Vec<NewsArticle> = payload
            .articles
            .into_iter()
            .filter_map(NewsApiArticle::into_article)
            .collect();
        debug!(count = articles.len(), "Fetched news articles");
        Ok(articles)
    }
}

#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsApiArticle {
    source: NewsApiSourceName,
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct NewsApiSourceName {
    name: Option<String>,
}

impl NewsApiArticle {
    /// Drop entries without a headline, which the API uses for removed items
    fn into_article(self) -> Option<NewsArticle> {
        let title = self.title.filter(|t| !t.trim().is_empty() && t != "[Removed]")?;
        Some(NewsArticle {
            title,
            source: self.source.name.unwrap_or_else(|| "unknown".to_string()),
            published_at: self.published_at,
            description: self.description,
            url: self.url.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_creation() {
        let source = NewsApiSource::new("test_key", 10, 60).unwrap();
        assert_eq!(source.api_key, "test_key");
        assert_eq!(source.api_base, NEWS_API_BASE);
        assert!(NewsApiSource::new("k", 10, 0).is_err());
    }

    #[test]
    fn test_from_config_requires_key() {
        let err = NewsApiSource::from_config(&AnalystConfig::default()).err().unwrap();
        assert!(matches!(err, AnalystError::ConfigError(ref m) if m.contains("NEWS_API_KEY")));
    }

    #[test]
    fn test_response_parsing_skips_removed() {
        let payload: NewsApiResponse = serde_json::from_value(json!({
            "status": "ok",
            "totalResults": 2,
            "articles": [
                {
                    "source": {"id": null, "name": "Wire"},
                    "title": "Acme beats estimates",
                    "description": "Quarterly revenue rose.",
                    "url": "https://example.com/a",
                    "publishedAt": "2026-10-17T14:00:00Z"
                },
                {
                    "source": {"id": null, "name": "[Removed]"},
                    "title": "[Removed]",
                    "description": null,
                    "url": "https://removed.com",
                    "publishedAt": "2026-10-16T09:00:00Z"
                }
            ]
        }))
        .unwrap();

        let articles: Vec<_> = payload
            .articles
            .into_iter()
            .filter_map(NewsApiArticle::into_article)
            .collect();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].source, "Wire");
    }

    #[test]
    fn test_render_articles() {
        let articles = vec![NewsArticle {
            title: "Acme beats estimates".to_string(),
            source: "Wire".to_string(),
            published_at: DateTime::from_timestamp(1_792_000_000, 0),
            description: Some(" Revenue rose. ".to_string()),
            url: String::new(),
        }];

        let text = render_articles("Acme Corp", &articles);
        assert!(text.starts_with("1. Acme beats estimates (Wire, "));
        assert!(text.contains("   Revenue rose.\n"));
    }

    #[test]
    fn test_render_no_articles() {
        assert_eq!(
            render_articles("Acme Corp", &[]),
            "No recent news articles were found for Acme Corp."
        );
    }
}
