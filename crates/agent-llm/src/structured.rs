//! Typed records out of a completion
//!
//! A record type describes itself as a tool. [`complete_structured`] offers
//! the model exactly that tool, forces a call to it, and deserializes the
//! call's input. Models that answer in prose anyway are tolerated as long as
//! the answer contains a JSON object.

use crate::{CompletionRequest, LLMError, LLMProvider, Message, Result, ToolChoice, ToolDefinition};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// A record the model can be asked to produce
pub trait StructuredOutput: DeserializeOwned {
    /// Tool name the record is requested under
    const NAME: &'static str;

    /// Tool description shown to the model
    const DESCRIPTION: &'static str;

    /// JSON schema of the record
    fn schema() -> Value;

    /// The record as a tool definition
    fn tool_definition() -> ToolDefinition {
        ToolDefinition::new(Self::NAME, Self::DESCRIPTION, Self::schema())
    }
}

/// Run `request` and parse the answer as `T`
///
/// Any tools or tool choice already on the request are replaced.
pub async fn complete_structured<T: StructuredOutput>(
    provider: &dyn LLMProvider,
    request: CompletionRequest,
) -> Result<T> {
    let value = complete_record(provider, request, T::tool_definition()).await?;
    serde_json::from_value(value).map_err(|e| {
        LLMError::UnexpectedResponse(format!("'{}' output does not match its schema: {e}", T::NAME))
    })
}

/// Run `request` forcing a call to `tool` and return the raw call input
///
/// For callers that apply their own parsing and validation.
pub async fn complete_record(
    provider: &dyn LLMProvider,
    mut request: CompletionRequest,
    tool: ToolDefinition,
) -> Result<Value> {
    let name = tool.name.clone();
    request.tool_choice = Some(ToolChoice::tool(&name));
    request.tools = Some(vec![tool]);

    let response = provider.complete(request).await?;
    debug!(
        record = %name,
        provider = provider.name(),
        stop_reason = ?response.stop_reason,
        tokens = response.usage.total(),
        "Structured completion received"
    );

    extract_value(&response.message, &name)
}

/// Pull the record out of an assistant message
///
/// Prefers the input of a call to `tool_name`; falls back to the first JSON
/// object in the message text.
pub fn extract_value(message: &Message, tool_name: &str) -> Result<Value> {
    if let Some(input) = message.tool_input(tool_name) {
        return Ok(input.clone());
    }

    let text = message.text().unwrap_or_default();
    warn!(record = tool_name, "Model answered without calling the record tool");
    extract_json(text)?.ok_or_else(|| {
        LLMError::UnexpectedResponse(format!("No '{tool_name}' record found in the response"))
    })
}

static FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json)?\s*(.*?)```").expect("fence pattern is valid")
});

/// Find the first JSON object in free text
///
/// A fenced ```json block wins over bare text. Trailing prose after the
/// object is ignored.
pub fn extract_json(text: &str) -> Result<Option<Value>> {
    let candidate = FENCE
        .captures(text)
        .and_then(|c| c.get(1))
        .map_or(text, |m| m.as_str());

    let Some(start) = candidate.find('{') else {
        return Ok(None);
    };

    let mut stream = serde_json::Deserializer::from_str(&candidate[start..]).into_iter::<Value>();
    match stream.next() {
        Some(Ok(value @ Value::Object(_))) => Ok(Some(value)),
        Some(Ok(_)) | None => Ok(None),
        Some(Err(e)) => Err(LLMError::UnexpectedResponse(format!(
            "Malformed JSON in response text: {e}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        CompletionResponse, ContentBlock, MessageContent, Role, StopReason, TokenUsage,
    };
    use async_trait::async_trait;
    use mockall::mock;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Quote {
        symbol: String,
        price: f64,
    }

    impl StructuredOutput for Quote {
        const NAME: &'static str = "quote";
        const DESCRIPTION: &'static str = "A price quote";

        fn schema() -> Value {
            crate::tools::schema::object(
                json!({
                    "symbol": crate::tools::schema::string("Ticker"),
                    "price": crate::tools::schema::number("Price"),
                }),
                &["symbol", "price"],
            )
        }
    }

    mock! {
        Provider {}

        #[async_trait]
        impl LLMProvider for Provider {
            async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;
            fn name(&self) -> &str;
        }
    }

    fn reply(blocks: Vec<ContentBlock>) -> CompletionResponse {
        CompletionResponse {
            message: Message {
                role: Role::Assistant,
                content: Some(MessageContent::Blocks(blocks)),
            },
            stop_reason: StopReason::ToolUse,
            usage: TokenUsage::default(),
        }
    }

    #[tokio::test]
    async fn test_forces_record_tool() {
        let mut provider = MockProvider::new();
        provider.expect_name().return_const("mock".to_string());
        provider
            .expect_complete()
            .withf(|req| {
                req.tool_choice == Some(ToolChoice::tool("quote"))
                    && req.tools.as_ref().is_some_and(|t| t.len() == 1 && t[0].name == "quote")
            })
            .times(1)
            .returning(|_| {
                Ok(reply(vec![ContentBlock::ToolUse {
                    id: "toolu_1".to_string(),
                    name: "quote".to_string(),
                    input: json!({"symbol": "ACME", "price": 12.5}),
                }]))
            });

        let request = CompletionRequest::builder("m")
            .add_message(Message::user("price?"))
            .build();
        let quote: Quote = complete_structured(&provider, request).await.unwrap();
        assert_eq!(
            quote,
            Quote {
                symbol: "ACME".to_string(),
                price: 12.5
            }
        );
    }

    #[tokio::test]
    async fn test_text_fallback() {
        let mut provider = MockProvider::new();
        provider.expect_name().return_const("mock".to_string());
        provider.expect_complete().returning(|_| {
            Ok(reply(vec![ContentBlock::Text {
                text: "Sure:\n```json\n{\"symbol\": \"ACME\", \"price\": 3}\n```".to_string(),
            }]))
        });

        let request = CompletionRequest::builder("m").build();
        let quote: Quote = complete_structured(&provider, request).await.unwrap();
        assert_eq!(quote.price, 3.0);
    }

    #[tokio::test]
    async fn test_schema_mismatch_is_unexpected_response() {
        let mut provider = MockProvider::new();
        provider.expect_name().return_const("mock".to_string());
        provider.expect_complete().returning(|_| {
            Ok(reply(vec![ContentBlock::ToolUse {
                id: "toolu_1".to_string(),
                name: "quote".to_string(),
                input: json!({"symbol": "ACME"}),
            }]))
        });

        let request = CompletionRequest::builder("m").build();
        let err = complete_structured::<Quote>(&provider, request)
            .await
            .unwrap_err();
        assert!(matches!(err, LLMError::UnexpectedResponse(ref m) if m.contains("'quote'")));
    }

    #[test]
    fn test_extract_json_bare_object_with_trailing_text() {
        let value = extract_json("Result: {\"a\": 1} hope that helps")
            .unwrap()
            .unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn test_extract_json_prefers_fenced_block() {
        let text = "Draft {\"a\": 0}\n```json\n{\"a\": 2}\n```";
        for _ in 0..2 {
            assert_eq!(extract_json(text).unwrap(), Some(json!({"a": 2})));
        }
        let plain = "```\n{\"b\": true}\n```";
        assert_eq!(extract_json(plain).unwrap(), Some(json!({"b": true})));
    }

    #[test]
    fn test_extract_json_none_without_object() {
        assert!(extract_json("no data here").unwrap().is_none());
    }

    #[test]
    fn test_extract_json_malformed() {
        tokio_test::assert_err!(extract_json("{\"a\": "));
    }
}
