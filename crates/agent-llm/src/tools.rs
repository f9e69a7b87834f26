//! Tool definition types for LLM tool use
//!
//! Tools are how the pipeline gets typed records out of a model: each record
//! is described as a tool whose input schema is the record's JSON schema.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tool definition for LLM provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON schema for the tool's input parameters
    pub input_schema: Value,
}

impl ToolDefinition {
    /// Create a new tool definition
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// Helper module to build JSON schemas for tools
pub mod schema {
    use serde_json::{Value, json};

    /// Create a JSON schema for an object with properties
    ///
    /// # Example
    ///
    /// ```
    /// use agent_llm::tools::schema;
    /// use serde_json::json;
    ///
    /// let schema = schema::object(
    ///     json!({
    ///         "current_price": schema::number("Latest close"),
    ///         "pe_ratio": schema::nullable(schema::number("Price to earnings")),
    ///     }),
    ///     &["current_price"],
    /// );
    /// assert_eq!(schema["required"][0], "current_price");
    /// ```
    pub fn object(properties: Value, required: &[&str]) -> Value {
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// String property schema
    pub fn string(description: &str) -> Value {
        json!({
            "type": "string",
            "description": description,
        })
    }

    /// Number property schema
    pub fn number(description: &str) -> Value {
        json!({
            "type": "number",
            "description": description,
        })
    }

    /// Number property schema with inclusive bounds
    pub fn bounded_number(description: &str, minimum: f64, maximum: f64) -> Value {
        json!({
            "type": "number",
            "description": description,
            "minimum": minimum,
            "maximum": maximum,
        })
    }

    /// Integer property schema
    pub fn integer(description: &str) -> Value {
        json!({
            "type": "integer",
            "description": description,
        })
    }

    /// String restricted to `values`
    pub fn enumeration(description: &str, values: &[&str]) -> Value {
        json!({
            "type": "string",
            "description": description,
            "enum": values,
        })
    }

    /// Array property schema
    pub fn array(description: &str, items: Value) -> Value {
        json!({
            "type": "array",
            "description": description,
            "items": items,
        })
    }

    /// Allow `null` in addition to the given schema's type
    pub fn nullable(mut schema: Value) -> Value {
        if let Some(ty) = schema.get("type").cloned() {
            schema["type"] = json!([ty, "null"]);
        }
        schema
    }
}
