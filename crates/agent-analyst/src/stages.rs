//! Pipeline stages wrapping the data sources and analysts
//!
//! Each stage reads the identifying fields from the state, gathers its own
//! input and returns a delta holding only its record.

use crate::agents::{QualAnalyst, QuantAnalyst, ReportWriter};
use crate::data::{NewsSource, PriceDataSource, render_articles};
use crate::state::{COMPANY_NAME, FINAL_REPORT, QUAL_ANALYSIS, QUANT_ANALYSIS, SYMBOL};
use agent_core::{Context, Result, Stage};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument};

pub const QUANT_STAGE: &str = "quant_analyst";
pub const QUAL_STAGE: &str = "qual_analyst";
pub const REPORT_STAGE: &str = "report_writer";

/// Price data in, quantitative analysis out
pub struct QuantStage {
    prices: Arc<dyn PriceDataSource>,
    analyst: Arc<dyn QuantAnalyst>,
}

impl QuantStage {
    pub fn new(prices: Arc<dyn PriceDataSource>, analyst: Arc<dyn QuantAnalyst>) -> Self {
        Self { prices, analyst }
    }
}

#[async_trait]
impl Stage for QuantStage {
    #[instrument(skip_all, fields(stage = QUANT_STAGE))]
    async fn run(&self, state: &Context) -> Result<Context> {
        let company_name = state.require(COMPANY_NAME)?;
        let symbol = state.require(SYMBOL)?;

        let snapshot = self.prices.snapshot(&symbol).await?;
        let stock_data = snapshot.render();
        debug!(%symbol, price = snapshot.current_price, "Price data ready");

        let analysis = self
            .analyst
            .analyze(&company_name, &symbol, &stock_data)
            .await?;
        Context::new().with(QUANT_ANALYSIS, &analysis)
    }

    fn name(&self) -> &str {
        QUANT_STAGE
    }
}

/// News in, qualitative analysis out
pub struct QualStage {
    news: Arc<dyn NewsSource>,
    analyst: Arc<dyn QualAnalyst>,
}

impl QualStage {
    pub fn new(news: Arc<dyn NewsSource>, analyst: Arc<dyn QualAnalyst>) -> Self {
        Self { news, analyst }
    }
}

#[async_trait]
impl Stage for QualStage {
    #[instrument(skip_all, fields(stage = QUAL_STAGE))]
    async fn run(&self, state: &Context) -> Result<Context> {
        let company_name = state.require(COMPANY_NAME)?;
        let symbol = state.require(SYMBOL)?;

        let articles = self.news.articles(&company_name).await?;
        debug!(%company_name, count = articles.len(), "News ready");
        let news_data = render_articles(&company_name, &articles);

        let analysis = self
            .analyst
            .analyze(&company_name, &symbol, &news_data)
            .await?;
        Context::new().with(QUAL_ANALYSIS, &analysis)
    }

    fn name(&self) -> &str {
        QUAL_STAGE
    }
}

/// Both analyses in, final report out
pub struct ReportStage {
    writer: Arc<dyn ReportWriter>,
}

impl ReportStage {
    pub fn new(writer: Arc<dyn ReportWriter>) -> Self {
        Self { writer }
    }
}

#[async_trait]
impl Stage for ReportStage {
    #[instrument(skip_all, fields(stage = REPORT_STAGE))]
    async fn run(&self, state: &Context) -> Result<Context> {
        let company_name = state.require(COMPANY_NAME)?;
        let symbol = state.require(SYMBOL)?;
        let quant = state.require(QUANT_ANALYSIS)?;
        let qual = state.require(QUAL_ANALYSIS)?;

        let report = self
            .writer
            .write(&quant, &qual, &company_name, &symbol)
            .await?;
        Context::new().with(FINAL_REPORT, &report)
    }

    fn name(&self) -> &str {
        REPORT_STAGE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{MockQualAnalyst, MockReportWriter};
    use crate::data::MockNewsSource;
    use crate::models::fixtures;
    use crate::state::initial_state;

    #[tokio::test]
    async fn test_qual_stage_without_news() {
        let mut news = MockNewsSource::new();
        news.expect_articles()
            .withf(|company| company == "Acme Corp")
            .times(1)
            .returning(|_| Ok(Vec::new()));

        let mut analyst = MockQualAnalyst::new();
        analyst
            .expect_analyze()
            .withf(|company, symbol, text| {
                company == "Acme Corp"
                    && symbol == "ACME"
                    && text == "No recent news articles were found for Acme Corp."
            })
            .times(1)
            .returning(|_, _, _| Ok(fixtures::qual()));

        let stage = QualStage::new(Arc::new(news), Arc::new(analyst));
        let delta = stage.run(&initial_state("Acme Corp", "ACME").unwrap()).await.unwrap();

        assert_eq!(delta.keys(), vec!["qual_analysis"]);
        assert_eq!(delta.require(QUAL_ANALYSIS).unwrap(), fixtures::qual());
    }

    #[tokio::test]
    async fn test_report_stage_requires_analyses() {
        let mut writer = MockReportWriter::new();
        writer.expect_write().never();

        let stage = ReportStage::new(Arc::new(writer));
        let err = stage
            .run(&initial_state("Acme Corp", "ACME").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, agent_core::Error::MissingState(ref k) if k == "quant_analysis"));
    }
}
