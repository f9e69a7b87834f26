//! Qualitative analyst backed by an LLM

use super::{ModelSettings, QualAnalyst, request_record};
use crate::error::Result;
use crate::models::{QualitativeAnalysis, parse_validated};
use crate::prompts;
use agent_llm::{LLMProvider, StructuredOutput};
use agent_prompt::ChatPrompt;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::instrument;

/// Reads news and judges sentiment, risks and opportunities
pub struct LlmQualAnalyst {
    provider: Arc<dyn LLMProvider>,
    settings: ModelSettings,
    prompt: ChatPrompt,
}

impl LlmQualAnalyst {
    pub fn new(provider: Arc<dyn LLMProvider>, settings: ModelSettings) -> Result<Self> {
        Ok(Self {
            provider,
            settings,
            prompt: prompts::qualitative()?,
        })
    }
}

#[async_trait]
impl QualAnalyst for LlmQualAnalyst {
    #[instrument(skip(self, news_data), fields(model = %self.settings.model))]
    async fn analyze(
        &self,
        company_name: &str,
        symbol: &str,
        news_data: &str,
    ) -> Result<QualitativeAnalysis> {
        let vars = json!({
            "company_name": company_name,
            "symbol": symbol,
            "news_data": news_data,
        });
        let value = request_record(
            self.provider.as_ref(),
            &self.settings,
            &self.prompt,
            &vars,
            QualitativeAnalysis::tool_definition(),
        )
        .await?;
        parse_validated(value)
    }
}
