//! Quantitative analyst backed by an LLM

use super::{ModelSettings, QuantAnalyst, request_record};
use crate::error::Result;
use crate::models::{QuantitativeAnalysis, parse_validated};
use crate::prompts;
use agent_llm::{LLMProvider, StructuredOutput};
use agent_prompt::ChatPrompt;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::instrument;

/// Reads price data and extracts metrics and trends
pub struct LlmQuantAnalyst {
    provider: Arc<dyn LLMProvider>,
    settings: ModelSettings,
    prompt: ChatPrompt,
}

impl LlmQuantAnalyst {
    pub fn new(provider: Arc<dyn LLMProvider>, settings: ModelSettings) -> Result<Self> {
        Ok(Self {
            provider,
            settings,
            prompt: prompts::quantitative()?,
        })
    }
}

#[async_trait]
impl QuantAnalyst for LlmQuantAnalyst {
    #[instrument(skip(self, stock_data), fields(model = %self.settings.model))]
    async fn analyze(
        &self,
        company_name: &str,
        symbol: &str,
        stock_data: &str,
    ) -> Result<QuantitativeAnalysis> {
        let vars = json!({
            "company_name": company_name,
            "symbol": symbol,
            "stock_data": stock_data,
        });
        let value = request_record(
            self.provider.as_ref(),
            &self.settings,
            &self.prompt,
            &vars,
            QuantitativeAnalysis::tool_definition(),
        )
        .await?;
        parse_validated(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::test_support::{MockProvider, provider_returning, tool_reply};
    use crate::error::AnalystError;
    use agent_llm::ToolChoice;

    #[tokio::test]
    async fn test_analyze_parses_record() {
        let mut provider = MockProvider::new();
        provider.expect_name().return_const("mock".to_string());
        provider
            .expect_complete()
            .withf(|req| {
                req.tool_choice == Some(ToolChoice::tool("quantitative_analysis"))
                    && req.system.as_deref().is_some_and(|s| s.contains("Acme Corp (ACME)"))
                    && req.messages[0].text().is_some_and(|t| t.contains("Current price: 12.50"))
            })
            .times(1)
            .returning(|_| {
                Ok(tool_reply(
                    "quantitative_analysis",
                    json!({
                        "current_price": 12.5,
                        "price_change_24h": 0.25,
                        "volume": 1_000_000,
                        "market_cap": null,
                        "trend_analysis": "Steady climb",
                        "key_metrics_summary": "Healthy"
                    }),
                ))
            });

        let analyst = LlmQuantAnalyst::new(Arc::new(provider), ModelSettings::default()).unwrap();
        let analysis = analyst
            .analyze("Acme Corp", "ACME", "Current price: 12.50")
            .await
            .unwrap();

        assert_eq!(analysis.current_price, 12.5);
        assert_eq!(analysis.volume, Some(1_000_000));
        assert_eq!(analysis.market_cap, None);
        assert_eq!(analysis.pe_ratio, None);
    }

    #[tokio::test]
    async fn test_missing_required_field_is_validation_error() {
        let provider = provider_returning(
            "quantitative_analysis",
            json!({"current_price": 12.5, "trend_analysis": "Flat"}),
        );

        let analyst = LlmQuantAnalyst::new(Arc::new(provider), ModelSettings::default()).unwrap();
        let err = analyst.analyze("Acme Corp", "ACME", "data").await.unwrap_err();
        assert!(
            matches!(err, AnalystError::Validation { ref field, .. } if field == "quantitative_analysis")
        );
    }

    #[tokio::test]
    async fn test_negative_price_rejected() {
        let provider = provider_returning(
            "quantitative_analysis",
            json!({
                "current_price": -1.0,
                "trend_analysis": "Odd",
                "key_metrics_summary": "Odd"
            }),
        );

        let analyst = LlmQuantAnalyst::new(Arc::new(provider), ModelSettings::default()).unwrap();
        let err = analyst.analyze("Acme Corp", "ACME", "data").await.unwrap_err();
        assert!(matches!(err, AnalystError::Validation { ref field, .. } if field == "current_price"));
    }
}
