//! Error types for the analyst stages

use agent_llm::LLMError;
use agent_prompt::PromptError;
use thiserror::Error;

/// Analyst-specific errors
#[derive(Debug, Error)]
pub enum AnalystError {
    /// A record produced by the model violates its constraints
    #[error("Validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Upstream market or news data could not be obtained
    #[error("Data not available for {subject}: {reason}")]
    DataUnavailable { subject: String, reason: String },

    /// A data API answered with an error
    #[error("API error: {0}")]
    ApiError(String),

    /// Yahoo Finance API error
    #[error("Yahoo Finance error: {0}")]
    YahooFinanceError(String),

    /// Technical indicator calculation error
    #[error("Technical indicator error: {0}")]
    IndicatorError(String),

    /// Network or HTTP error
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// Model call failed
    #[error("LLM error: {0}")]
    Llm(#[from] LLMError),

    /// Prompt could not be built or rendered
    #[error("Prompt error: {0}")]
    Prompt(#[from] PromptError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl AnalystError {
    /// Shorthand for a validation failure
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        AnalystError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for analyst operations
pub type Result<T> = std::result::Result<T, AnalystError>;

/// Stage failures surface through the workflow as processing errors
impl From<AnalystError> for agent_core::Error {
    fn from(err: AnalystError) -> Self {
        agent_core::Error::ProcessingFailed(err.to_string())
    }
}
