//! Keys of the shared pipeline state

use crate::models::{InvestmentReport, QualitativeAnalysis, QuantitativeAnalysis};
use agent_core::{Context, Result, StateKey};
use agent_llm::Message;

pub const COMPANY_NAME: StateKey<String> = StateKey::new("company_name");
pub const SYMBOL: StateKey<String> = StateKey::new("symbol");

/// Conversation log; empty today, reserved for conversational stages
pub const MESSAGES: StateKey<Vec<Message>> = StateKey::new("messages");

pub const QUANT_ANALYSIS: StateKey<QuantitativeAnalysis> = StateKey::new("quant_analysis");
pub const QUAL_ANALYSIS: StateKey<QualitativeAnalysis> = StateKey::new("qual_analysis");
pub const FINAL_REPORT: StateKey<InvestmentReport> = StateKey::new("final_report");

/// State a run starts from
pub fn initial_state(company_name: &str, symbol: &str) -> Result<Context> {
    Context::new()
        .with(COMPANY_NAME, &company_name.to_string())?
        .with(SYMBOL, &symbol.to_string())?
        .with(MESSAGES, &Vec::new())
}
