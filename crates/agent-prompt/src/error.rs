//! Error types for prompt operations

use thiserror::Error;

/// Result type for prompt operations
pub type Result<T> = std::result::Result<T, PromptError>;

/// Errors that can occur during prompt operations
#[derive(Error, Debug)]
pub enum PromptError {
    /// Template source is not valid Jinja
    #[error("Failed to parse template '{name}': {detail}")]
    TemplateParseFailed { name: String, detail: String },

    /// Template rendering failed, including references to unset variables
    #[error("Failed to render template '{name}': {detail}")]
    RenderError { name: String, detail: String },

    /// Variables could not be turned into a template context
    #[error("Failed to serialize variables: {0}")]
    SerializationError(String),
}
