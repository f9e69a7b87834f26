//! Prompt templates for the analyst pipeline
//!
//! Prompts are Jinja2 templates rendered with MiniJinja. A [`ChatPrompt`]
//! pairs a system template with a human template; both see the same
//! variables.
//!
//! ```
//! use agent_prompt::JinjaTemplate;
//! use serde_json::json;
//!
//! let template = JinjaTemplate::new("ask", "What moved {{ symbol }} today?").unwrap();
//! assert_eq!(
//!     template.render(&json!({"symbol": "ACME"})).unwrap(),
//!     "What moved ACME today?"
//! );
//! ```

mod chat;
mod error;
mod jinja;

pub use chat::{ChatPrompt, RenderedPrompt};
pub use error::{PromptError, Result};
pub use jinja::JinjaTemplate;
