//! Configuration for the analyst stages

use crate::error::{AnalystError, Result};
use agent_llm::LLMProvider;
use agent_llm::providers::{AnthropicProvider, OpenAIProvider};
use agent_utils::parse_var;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

/// Which LLM service backs the analysts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Anthropic Messages API
    #[default]
    Anthropic,
    /// Any OpenAI-compatible chat completions API
    OpenAI,
}

impl ProviderKind {
    /// Model used when none is configured
    pub fn default_model(self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "claude-sonnet-4-5",
            ProviderKind::OpenAI => "gpt-4o",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anthropic" | "claude" => Ok(ProviderKind::Anthropic),
            "openai" | "openai-compatible" => Ok(ProviderKind::OpenAI),
            other => Err(format!("unknown provider '{other}'")),
        }
    }
}

/// Configuration for the analysis pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalystConfig {
    /// LLM service
    pub provider: ProviderKind,

    /// Model identifier passed to the provider
    pub model: String,

    /// Maximum tokens per analyst call
    pub max_tokens: usize,

    /// Sampling temperature
    pub temperature: f32,

    /// Days of daily price history to fetch
    pub price_history_days: u32,

    /// Key for the news search API
    pub news_api_key: Option<String>,

    /// Articles requested per company
    pub news_page_size: u32,

    /// News API requests allowed per minute
    pub news_rate_limit: u32,
}

impl Default for AnalystConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Anthropic,
            model: ProviderKind::Anthropic.default_model().to_string(),
            max_tokens: 4096,
            temperature: 0.2,
            price_history_days: 365,
            news_api_key: None,
            news_page_size: 10,
            news_rate_limit: 60,
        }
    }
}

impl AnalystConfig {
    /// Create a new configuration builder
    pub fn builder() -> AnalystConfigBuilder {
        AnalystConfigBuilder::default()
    }

    /// Load from environment variables
    ///
    /// Reads `LLM_PROVIDER`, `LLM_MODEL`, `LLM_MAX_TOKENS`, `LLM_TEMPERATURE`,
    /// `PRICE_HISTORY_DAYS`, `NEWS_API_KEY`, `NEWS_PAGE_SIZE` and
    /// `NEWS_RATE_LIMIT`. Unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config_err = |e: agent_utils::ConfigError| AnalystError::ConfigError(e.to_string());

        let mut builder = Self::builder();
        if let Some(provider) = parse_var::<ProviderKind, _>(&lookup, "LLM_PROVIDER").map_err(config_err)? {
            builder = builder.provider(provider);
        }
        if let Some(model) = lookup("LLM_MODEL").filter(|m| !m.trim().is_empty()) {
            builder = builder.model(model);
        }
        if let Some(max_tokens) = parse_var(&lookup, "LLM_MAX_TOKENS").map_err(config_err)? {
            builder = builder.max_tokens(max_tokens);
        }
        if let Some(temperature) = parse_var(&lookup, "LLM_TEMPERATURE").map_err(config_err)? {
            builder = builder.temperature(temperature);
        }
        if let Some(days) = parse_var(&lookup, "PRICE_HISTORY_DAYS").map_err(config_err)? {
            builder = builder.price_history_days(days);
        }
        if let Some(key) = lookup("NEWS_API_KEY").filter(|k| !k.trim().is_empty()) {
            builder = builder.news_api_key(key);
        }
        if let Some(size) = parse_var(&lookup, "NEWS_PAGE_SIZE").map_err(config_err)? {
            builder = builder.news_page_size(size);
        }
        if let Some(rate) = parse_var(&lookup, "NEWS_RATE_LIMIT").map_err(config_err)? {
            builder = builder.news_rate_limit(rate);
        }
        builder.build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(AnalystError::ConfigError("model must not be empty".to_string()));
        }
        if self.max_tokens == 0 {
            return Err(AnalystError::ConfigError(
                "max_tokens must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(AnalystError::ConfigError(format!(
                "temperature must be within [0, 1], got {}",
                self.temperature
            )));
        }
        // 52-week range and the 50-day average need most of a year
        if self.price_history_days < 60 {
            return Err(AnalystError::ConfigError(format!(
                "price_history_days must be at least 60, got {}",
                self.price_history_days
            )));
        }
        if !(1..=100).contains(&self.news_page_size) {
            return Err(AnalystError::ConfigError(format!(
                "news_page_size must be within [1, 100], got {}",
                self.news_page_size
            )));
        }
        if self.news_rate_limit == 0 {
            return Err(AnalystError::ConfigError(
                "news_rate_limit must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the configured LLM provider, reading its credentials from the
    /// environment
    pub fn build_provider(&self) -> Result<Arc<dyn LLMProvider>> {
        let provider: Arc<dyn LLMProvider> = match self.provider {
            ProviderKind::Anthropic => Arc::new(AnthropicProvider::from_env()?),
            ProviderKind::OpenAI => Arc::new(OpenAIProvider::from_env()?),
        };
        Ok(provider)
    }
}

/// Builder for AnalystConfig
#[derive(Debug, Default)]
pub struct AnalystConfigBuilder {
    provider: Option<ProviderKind>,
    model: Option<String>,
    max_tokens: Option<usize>,
    temperature: Option<f32>,
    price_history_days: Option<u32>,
    news_api_key: Option<String>,
    news_page_size: Option<u32>,
    news_rate_limit: Option<u32>,
}

impl AnalystConfigBuilder {
    /// Set the LLM provider
    pub fn provider(mut self, provider: ProviderKind) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the model; defaults to the provider's default model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set maximum tokens per call
    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set sampling temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set days of price history
    pub fn price_history_days(mut self, days: u32) -> Self {
        self.price_history_days = Some(days);
        self
    }

    /// Set the news API key
    pub fn news_api_key(mut self, key: impl Into<String>) -> Self {
        self.news_api_key = Some(key.into());
        self
    }

    /// Set articles per request
    pub fn news_page_size(mut self, size: u32) -> Self {
        self.news_page_size = Some(size);
        self
    }

    /// Set news requests per minute
    pub fn news_rate_limit(mut self, per_minute: u32) -> Self {
        self.news_rate_limit = Some(per_minute);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AnalystConfig> {
        let defaults = AnalystConfig::default();
        let provider = self.provider.unwrap_or(defaults.provider);

        let config = AnalystConfig {
            provider,
            model: self
                .model
                .unwrap_or_else(|| provider.default_model().to_string()),
            max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens),
            temperature: self.temperature.unwrap_or(defaults.temperature),
            price_history_days: self.price_history_days.unwrap_or(defaults.price_history_days),
            news_api_key: self.news_api_key,
            news_page_size: self.news_page_size.unwrap_or(defaults.news_page_size),
            news_rate_limit: self.news_rate_limit.unwrap_or(defaults.news_rate_limit),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = AnalystConfig::default();
        assert_eq!(config.provider, ProviderKind::Anthropic);
        assert_eq!(config.price_history_days, 365);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_model_follows_provider() {
        let config = AnalystConfig::builder()
            .provider(ProviderKind::OpenAI)
            .build()
            .unwrap();
        assert_eq!(config.model, "gpt-4o");
    }

    #[test]
    fn test_config_builder() {
        let config = AnalystConfig::builder()
            .model("claude-opus-4-1")
            .max_tokens(2048)
            .news_page_size(25)
            .build()
            .unwrap();

        assert_eq!(config.model, "claude-opus-4-1");
        assert_eq!(config.max_tokens, 2048);
        assert_eq!(config.news_page_size, 25);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        assert!(AnalystConfig::builder().temperature(1.5).build().is_err());
        assert!(AnalystConfig::builder().max_tokens(0).build().is_err());
        assert!(AnalystConfig::builder().price_history_days(30).build().is_err());
        assert!(AnalystConfig::builder().news_page_size(0).build().is_err());
        assert!(AnalystConfig::builder().news_rate_limit(0).build().is_err());
    }

    #[test]
    fn test_from_lookup() {
        let config = AnalystConfig::from_lookup(lookup(&[
            ("LLM_PROVIDER", "openai"),
            ("LLM_MAX_TOKENS", "1500"),
            ("NEWS_API_KEY", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.provider, ProviderKind::OpenAI);
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.max_tokens, 1500);
        assert_eq!(config.news_api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn test_from_lookup_bad_number() {
        let err = AnalystConfig::from_lookup(lookup(&[("LLM_TEMPERATURE", "warm")])).unwrap_err();
        assert!(matches!(err, AnalystError::ConfigError(ref m) if m.contains("LLM_TEMPERATURE")));
    }

    #[test]
    fn test_provider_parse() {
        assert_eq!("Claude".parse::<ProviderKind>().unwrap(), ProviderKind::Anthropic);
        assert!("gemini".parse::<ProviderKind>().is_err());
    }
}
