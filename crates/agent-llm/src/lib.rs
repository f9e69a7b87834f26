//! LLM provider abstraction layer
//!
//! This crate provides provider-agnostic abstractions for interacting with
//! Large Language Models (LLMs). It includes:
//!
//! - Message types for LLM communication
//! - Completion request/response types, including forced tool choice
//! - Tool definitions for function calling
//! - Structured output: typed records extracted from a completion
//! - Provider trait and concrete providers (behind feature flags)

pub mod completion;
pub mod error;
pub mod messages;
pub mod provider;
pub mod structured;
pub mod tools;

// Re-export main types
pub use completion::{CompletionRequest, CompletionResponse, StopReason, TokenUsage, ToolChoice};
pub use error::{LLMError, Result};
pub use messages::{ContentBlock, Message, MessageContent, Role};
pub use provider::LLMProvider;
pub use structured::{StructuredOutput, complete_record, complete_structured};
pub use tools::ToolDefinition;

pub mod providers;
