//! The three model-backed analysts
//!
//! Each analyst is a trait so the pipeline can be driven by mocks in tests.
//! The `Llm*` implementations render a chat prompt, force the model to answer
//! through the record's tool, and validate what comes back.

pub mod qual_analyst;
pub mod quant_analyst;
pub mod report_writer;

pub use qual_analyst::LlmQualAnalyst;
pub use quant_analyst::LlmQuantAnalyst;
pub use report_writer::LlmReportWriter;

use crate::config::AnalystConfig;
use crate::error::Result;
use crate::models::{InvestmentReport, QualitativeAnalysis, QuantitativeAnalysis};
use agent_llm::{CompletionRequest, LLMProvider, Message, ToolDefinition, complete_record};
use agent_prompt::ChatPrompt;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Produces a quantitative analysis from rendered price data
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuantAnalyst: Send + Sync {
    async fn analyze(
        &self,
        company_name: &str,
        symbol: &str,
        stock_data: &str,
    ) -> Result<QuantitativeAnalysis>;
}

/// Produces a qualitative analysis from rendered news
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QualAnalyst: Send + Sync {
    async fn analyze(
        &self,
        company_name: &str,
        symbol: &str,
        news_data: &str,
    ) -> Result<QualitativeAnalysis>;
}

/// Synthesizes both analyses into the final report
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReportWriter: Send + Sync {
    async fn write(
        &self,
        quant: &QuantitativeAnalysis,
        qual: &QualitativeAnalysis,
        company_name: &str,
        symbol: &str,
    ) -> Result<InvestmentReport>;
}

/// Model parameters shared by the analysts
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    pub model: String,
    pub max_tokens: usize,
    pub temperature: f32,
}

impl ModelSettings {
    pub fn from_config(config: &AnalystConfig) -> Self {
        Self {
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self::from_config(&AnalystConfig::default())
    }
}

/// Render `prompt` and ask the model to fill in `tool`
async fn request_record<V: Serialize + Sync>(
    provider: &dyn LLMProvider,
    settings: &ModelSettings,
    prompt: &ChatPrompt,
    vars: &V,
    tool: ToolDefinition,
) -> Result<Value> {
    let rendered = prompt.render(vars)?;
    debug!(
        prompt = prompt.name(),
        provider = provider.name(),
        human_len = rendered.human.len(),
        "Requesting structured record"
    );

    let request = CompletionRequest::builder(&settings.model)
        .system(rendered.system)
        .add_message(Message::user(rendered.human))
        .max_tokens(settings.max_tokens)
        .temperature(settings.temperature)
        .build();

    Ok(complete_record(provider, request, tool).await?)
}
