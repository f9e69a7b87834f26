//! Core Stage trait definition

use crate::{Context, Result};
use async_trait::async_trait;

/// A named step of a pipeline
///
/// A stage reads what it needs from the shared state and returns only the
/// entries it produces. The caller merges that delta into the state, so a
/// stage never mutates keys it does not own.
#[async_trait]
pub trait Stage: Send + Sync {
    /// Run the stage against the current state and return its output keys
    async fn run(&self, state: &Context) -> Result<Context>;

    /// Get the stage's name
    fn name(&self) -> &str;
}
