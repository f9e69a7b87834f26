//! Stage orchestration for the analyst pipeline
//!
//! A [`Workflow`] runs named stages over a shared [`agent_core::Context`] in
//! the order given by its edge list, merging each stage's output into the
//! state before the next stage starts.

pub mod cancel;
pub mod workflow;

// Re-export for convenience
pub use cancel::{CancellationHandle, CancellationSignal};
pub use workflow::{StageRecord, Workflow, WorkflowBuilder, WorkflowOutput};
