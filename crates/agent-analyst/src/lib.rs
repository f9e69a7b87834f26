//! Multi-stage financial analysis
//!
//! Given a company name and a ticker symbol, this crate fetches price history
//! and recent news, runs two independent LLM analyses over them and
//! synthesizes both into an [`InvestmentReport`]:
//!
//! - `quant_analyst`: price data in, [`QuantitativeAnalysis`] out
//! - `qual_analyst`: news in, [`QualitativeAnalysis`] out
//! - `report_writer`: both analyses in, [`InvestmentReport`] out
//!
//! The stages run strictly in that order over a shared
//! [`agent_core::Context`]; the first failure ends the run.
//!
//! # Example
//!
//! ```rust,no_run
//! use agent_analyst::{AnalysisPipeline, AnalystConfig};
//! use agent_workflow::CancellationSignal;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AnalystConfig::from_env()?;
//!     let pipeline = AnalysisPipeline::from_config(&config)?;
//!
//!     let (report, _trace) = pipeline
//!         .run_with_trace("Acme Corp", "ACME", CancellationSignal::never())
//!         .await?;
//!     println!("{}: {}", report.stock_symbol, report.investment_recommendation);
//!     Ok(())
//! }
//! ```

pub mod agents;
pub mod config;
pub mod data;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod prompts;
pub mod stages;
pub mod state;

pub use config::{AnalystConfig, AnalystConfigBuilder, ProviderKind};
pub use error::{AnalystError, Result};
pub use models::{
    InvestmentReport, QualitativeAnalysis, QuantitativeAnalysis, Recommendation, Sentiment,
    Validate,
};
pub use pipeline::{AnalysisPipeline, AnalysisPipelineBuilder, AnalysisRunner};
