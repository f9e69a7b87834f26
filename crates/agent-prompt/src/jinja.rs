//! MiniJinja-based template implementation

use crate::{PromptError, Result};
use minijinja::{Environment, UndefinedBehavior};
use serde::Serialize;

/// A single prompt template backed by MiniJinja
///
/// The source is checked when the template is created. Rendering is strict:
/// referencing a variable that was not supplied is an error rather than an
/// empty string.
///
/// # Examples
///
/// ```
/// use agent_prompt::JinjaTemplate;
/// use serde_json::json;
///
/// let template = JinjaTemplate::new("greeting", "Analyze {{ symbol | upper }}").unwrap();
/// let text = template.render(&json!({ "symbol": "acme" })).unwrap();
/// assert_eq!(text, "Analyze ACME");
/// ```
#[derive(Clone)]
pub struct JinjaTemplate {
    name: String,
    source: String,
}

impl JinjaTemplate {
    /// Create a template, validating its syntax
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let source = source.into();

        environment()
            .template_from_str(&source)
            .map_err(|e| PromptError::TemplateParseFailed {
                name: name.clone(),
                detail: e.to_string(),
            })?;

        Ok(Self { name, source })
    }

    /// Template name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Render with any serializable variables
    pub fn render<S: Serialize>(&self, vars: &S) -> Result<String> {
        let value = serde_json::to_value(vars)
            .map_err(|e| PromptError::SerializationError(e.to_string()))?;

        environment()
            .render_str(&self.source, minijinja::Value::from_serialize(&value))
            .map_err(|e| PromptError::RenderError {
                name: self.name.clone(),
                detail: e.to_string(),
            })
    }
}

impl std::fmt::Debug for JinjaTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JinjaTemplate")
            .field("name", &self.name)
            .field("len", &self.source.len())
            .finish()
    }
}

fn environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.add_filter("trim", |s: String| s.trim().to_string());
    env.add_filter("signed", |v: f64| format!("{v:+.2}"));
    env
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_simple_template() {
        let template = JinjaTemplate::new("simple", "Hello, {{ name }}!").unwrap();
        assert_eq!(template.name(), "simple");
        assert_eq!(template.render(&json!({"name": "World"})).unwrap(), "Hello, World!");
    }

    #[test]
    fn test_invalid_template_error() {
        let err = JinjaTemplate::new("broken", "{% if %}").unwrap_err();
        assert!(matches!(err, PromptError::TemplateParseFailed { ref name, .. } if name == "broken"));
    }

    #[test]
    fn test_missing_variable_is_error() {
        let template = JinjaTemplate::new("strict", "Price: {{ price }}").unwrap();
        let err = template.render(&json!({})).unwrap_err();
        assert!(matches!(err, PromptError::RenderError { .. }));
    }

    #[test]
    fn test_conditional_and_loop() {
        let template = JinjaTemplate::new(
            "risks",
            "{% if risks %}{% for r in risks %}- {{ r }}\n{% endfor %}{% else %}none{% endif %}",
        )
        .unwrap();

        let listed = template.render(&json!({"risks": ["debt", "competition"]})).unwrap();
        assert_eq!(listed, "- debt\n- competition\n");
        assert_eq!(template.render(&json!({"risks": []})).unwrap(), "none");
    }

    #[test]
    fn test_signed_filter() {
        let template = JinjaTemplate::new("change", "{{ change | signed }}%").unwrap();
        assert_eq!(template.render(&json!({"change": 1.5})).unwrap(), "+1.50%");
        assert_eq!(template.render(&json!({"change": -0.25})).unwrap(), "-0.25%");
    }
}
