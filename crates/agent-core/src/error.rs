//! Error types for agent-core

use std::time::Duration;
use thiserror::Error;

/// Result type alias for agent-core
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for stage and pipeline operations
#[derive(Error, Debug)]
pub enum Error {
    /// Generic error message
    #[error("{0}")]
    Generic(String),

    /// Pipeline or stage construction failed
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    /// Stage processing failed
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),

    /// A state key a stage depends on is absent
    #[error("Missing state key: {0}")]
    MissingState(String),

    /// A stage tried to overwrite a key already present in the state
    #[error("State key '{0}' is already set and cannot be overwritten")]
    StateConflict(String),

    /// A named stage failed; no downstream stage was run
    #[error("Stage '{stage}' failed: {source}")]
    StageFailed {
        stage: String,
        #[source]
        source: Box<Error>,
    },

    /// The run was cancelled before it finished
    #[error("Run cancelled")]
    Cancelled,

    /// The run did not finish within its deadline
    #[error("Run exceeded its deadline of {0:?}")]
    DeadlineExceeded(Duration),
}

impl Error {
    /// Wrap an error with the name of the stage that produced it
    pub fn in_stage(stage: impl Into<String>, source: Error) -> Self {
        Error::StageFailed {
            stage: stage.into(),
            source: Box::new(source),
        }
    }

    /// The innermost error, unwrapping stage attribution
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::StageFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
