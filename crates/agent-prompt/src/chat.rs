//! System + human prompt pairs

use crate::{JinjaTemplate, Result};
use serde::Serialize;

/// A rendered chat prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    /// System instructions
    pub system: String,
    /// First user turn
    pub human: String,
}

/// A chat prompt made of a system template and a human template
///
/// Both templates are rendered against the same variables.
///
/// ```
/// use agent_prompt::ChatPrompt;
/// use serde_json::json;
///
/// let prompt = ChatPrompt::new(
///     "summary",
///     "You summarize news about {{ company }}.",
///     "Articles:\n{{ articles }}",
/// )
/// .unwrap();
///
/// let rendered = prompt
///     .render(&json!({"company": "Acme", "articles": "none"}))
///     .unwrap();
/// assert_eq!(rendered.system, "You summarize news about Acme.");
/// ```
#[derive(Debug, Clone)]
pub struct ChatPrompt {
    name: String,
    system: JinjaTemplate,
    human: JinjaTemplate,
}

impl ChatPrompt {
    /// Create a chat prompt from two template sources
    pub fn new(
        name: impl Into<String>,
        system: impl Into<String>,
        human: impl Into<String>,
    ) -> Result<Self> {
        let name = name.into();
        Ok(Self {
            system: JinjaTemplate::new(format!("{name}.system"), system)?,
            human: JinjaTemplate::new(format!("{name}.human"), human)?,
            name,
        })
    }

    /// Prompt name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Render both templates
    pub fn render<S: Serialize>(&self, vars: &S) -> Result<RenderedPrompt> {
        Ok(RenderedPrompt {
            system: self.system.render(vars)?,
            human: self.human.render(vars)?,
        })
    }
}
