//! Report writer backed by an LLM

use super::{ModelSettings, ReportWriter, request_record};
use crate::error::{AnalystError, Result};
use crate::models::{InvestmentReport, QualitativeAnalysis, QuantitativeAnalysis, Validate};
use crate::prompts;
use agent_llm::{LLMProvider, StructuredOutput};
use agent_prompt::ChatPrompt;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::instrument;

const DEFAULT_ANALYSIS_PERIOD: &str = "Trailing 12 months";

/// Combines both analyses into an investment report
pub struct LlmReportWriter {
    provider: Arc<dyn LLMProvider>,
    settings: ModelSettings,
    prompt: ChatPrompt,
}

impl LlmReportWriter {
    pub fn new(provider: Arc<dyn LLMProvider>, settings: ModelSettings) -> Result<Self> {
        Ok(Self {
            provider,
            settings,
            prompt: prompts::report_writer()?,
        })
    }
}

/// Pin the identifying fields to the request and fill dates the model skipped
fn normalize(report: &mut InvestmentReport, company_name: &str, symbol: &str) {
    company_name.clone_into(&mut report.company_name);
    symbol.clone_into(&mut report.stock_symbol);
    if report.report_date.trim().is_empty() {
        report.report_date = Utc::now().format("%Y-%m-%d").to_string();
    }
    if report.analysis_period.trim().is_empty() {
        report.analysis_period = DEFAULT_ANALYSIS_PERIOD.to_string();
    }
}

#[async_trait]
impl ReportWriter for LlmReportWriter {
    #[instrument(skip(self, quant, qual), fields(model = %self.settings.model))]
    async fn write(
        &self,
        quant: &QuantitativeAnalysis,
        qual: &QualitativeAnalysis,
        company_name: &str,
        symbol: &str,
    ) -> Result<InvestmentReport> {
        let vars = json!({
            "company_name": company_name,
            "symbol": symbol,
            "quant": quant,
            "qual": qual,
        });
        let value = request_record(
            self.provider.as_ref(),
            &self.settings,
            &self.prompt,
            &vars,
            InvestmentReport::tool_definition(),
        )
        .await?;

        let mut report: InvestmentReport = serde_json::from_value(value)
            .map_err(|e| AnalystError::validation(InvestmentReport::NAME, e.to_string()))?;
        normalize(&mut report, company_name, symbol);
        report.validate()?;
        Ok(report)
    }
}
