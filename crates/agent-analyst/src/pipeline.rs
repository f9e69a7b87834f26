//! The assembled analysis pipeline
//!
//! quant_analyst -> qual_analyst -> report_writer over one shared state,
//! with the final report read back from `final_report`.

use crate::agents::{
    LlmQualAnalyst, LlmQuantAnalyst, LlmReportWriter, ModelSettings, QualAnalyst, QuantAnalyst,
    ReportWriter,
};
use crate::config::AnalystConfig;
use crate::data::{NewsApiSource, NewsSource, PriceDataSource, YahooPriceSource};
use crate::error::{AnalystError, Result};
use crate::models::InvestmentReport;
use crate::stages::{QualStage, QuantStage, ReportStage};
use crate::state::{FINAL_REPORT, initial_state};
use agent_workflow::{CancellationSignal, StageRecord, Workflow};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

const WORKFLOW_NAME: &str = "financial_analysis";

/// Anything that turns a company and symbol into a report
///
/// The HTTP tracker and the CLI depend on this rather than on the pipeline
/// itself.
#[async_trait]
pub trait AnalysisRunner: Send + Sync {
    async fn run(
        &self,
        company_name: &str,
        symbol: &str,
        cancel: CancellationSignal,
    ) -> agent_core::Result<InvestmentReport>;
}

/// Runs the three analyst stages in order
#[derive(Debug)]
pub struct AnalysisPipeline {
    workflow: Workflow,
}

impl AnalysisPipeline {
    pub fn builder() -> AnalysisPipelineBuilder {
        AnalysisPipelineBuilder::default()
    }

    /// Wire the production collaborators from configuration
    ///
    /// Reads LLM credentials from the environment and requires a news API key.
    pub fn from_config(config: &AnalystConfig) -> Result<Self> {
        Self::builder_from_config(config)?.build()
    }

    /// A builder preloaded with the production collaborators, for callers
    /// that want to adjust it (e.g. set a deadline) before building
    pub fn builder_from_config(config: &AnalystConfig) -> Result<AnalysisPipelineBuilder> {
        config.validate()?;
        let provider = config.build_provider()?;
        let settings = ModelSettings::from_config(config);

        Ok(Self::builder()
            .prices(Arc::new(YahooPriceSource::new(config.price_history_days)))
            .news(Arc::new(NewsApiSource::from_config(config)?))
            .quant_analyst(Arc::new(LlmQuantAnalyst::new(Arc::clone(&provider), settings.clone())?))
            .qual_analyst(Arc::new(LlmQualAnalyst::new(Arc::clone(&provider), settings.clone())?))
            .report_writer(Arc::new(LlmReportWriter::new(provider, settings)?)))
    }

    /// The underlying stage graph
    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    /// Run once and also return per-stage timings
    #[instrument(skip(self, cancel))]
    pub async fn run_with_trace(
        &self,
        company_name: &str,
        symbol: &str,
        cancel: CancellationSignal,
    ) -> agent_core::Result<(InvestmentReport, Vec<StageRecord>)> {
        let output = self
            .workflow
            .execute(initial_state(company_name, symbol)?, cancel)
            .await?;
        let report = output.state.require(FINAL_REPORT)?;
        info!(
            recommendation = %report.investment_recommendation,
            confidence = report.confidence_level,
            "Analysis finished"
        );
        Ok((report, output.trace))
    }
}

#[async_trait]
impl AnalysisRunner for AnalysisPipeline {
    async fn run(
        &self,
        company_name: &str,
        symbol: &str,
        cancel: CancellationSignal,
    ) -> agent_core::Result<InvestmentReport> {
        let (report, _) = self.run_with_trace(company_name, symbol, cancel).await?;
        Ok(report)
    }
}

/// Builder for [`AnalysisPipeline`]
#[derive(Default)]
pub struct AnalysisPipelineBuilder {
    prices: Option<Arc<dyn PriceDataSource>>,
    news: Option<Arc<dyn NewsSource>>,
    quant: Option<Arc<dyn QuantAnalyst>>,
    qual: Option<Arc<dyn QualAnalyst>>,
    writer: Option<Arc<dyn ReportWriter>>,
    deadline: Option<Duration>,
}

impl AnalysisPipelineBuilder {
    pub fn prices(mut self, prices: Arc<dyn PriceDataSource>) -> Self {
        self.prices = Some(prices);
        self
    }

    pub fn news(mut self, news: Arc<dyn NewsSource>) -> Self {
        self.news = Some(news);
        self
    }

    pub fn quant_analyst(mut self, analyst: Arc<dyn QuantAnalyst>) -> Self {
        self.quant = Some(analyst);
        self
    }

    pub fn qual_analyst(mut self, analyst: Arc<dyn QualAnalyst>) -> Self {
        self.qual = Some(analyst);
        self
    }

    pub fn report_writer(mut self, writer: Arc<dyn ReportWriter>) -> Self {
        self.writer = Some(writer);
        self
    }

    /// Bound the whole run
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn build(self) -> Result<AnalysisPipeline> {
        let prices = self.prices.ok_or_else(|| missing("prices"))?;
        let news = self.news.ok_or_else(|| missing("news"))?;
        let quant = self.quant.ok_or_else(|| missing("quant_analyst"))?;
        let qual = self.qual.ok_or_else(|| missing("qual_analyst"))?;
        let writer = self.writer.ok_or_else(|| missing("report_writer"))?;

        let mut builder = Workflow::builder(WORKFLOW_NAME)
            .then(Arc::new(QuantStage::new(prices, quant)))
            .then(Arc::new(QualStage::new(news, qual)))
            .then(Arc::new(ReportStage::new(writer)));
        if let Some(deadline) = self.deadline {
            builder = builder.with_deadline(deadline);
        }

        let workflow = builder
            .build()
            .map_err(|e| AnalystError::ConfigError(e.to_string()))?;
        Ok(AnalysisPipeline { workflow })
    }
}

fn missing(component: &str) -> AnalystError {
    AnalystError::ConfigError(format!("pipeline is missing its {component}"))
}
