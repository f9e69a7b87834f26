//! Prompt templates for the analyst stages
//!
//! Template sources live in `system` and `user`; the constructors here pair
//! them into [`ChatPrompt`]s.
//!
//! Variables:
//! - quantitative: `company_name`, `symbol`, `stock_data`
//! - qualitative: `company_name`, `symbol`, `news_data`
//! - report writer: `company_name`, `symbol`, `quant`, `qual`

mod system;
mod user;

use agent_prompt::{ChatPrompt, Result};

/// Prompt for the quantitative analyst
pub fn quantitative() -> Result<ChatPrompt> {
    ChatPrompt::new("analyst.quantitative", system::QUANTITATIVE, user::QUANTITATIVE)
}

/// Prompt for the qualitative analyst
pub fn qualitative() -> Result<ChatPrompt> {
    ChatPrompt::new("analyst.qualitative", system::QUALITATIVE, user::QUALITATIVE)
}

/// Prompt for the report writer
pub fn report_writer() -> Result<ChatPrompt> {
    ChatPrompt::new("analyst.report_writer", system::REPORT_WRITER, user::REPORT_WRITER)
}
