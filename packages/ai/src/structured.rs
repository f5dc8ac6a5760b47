//! Structured output through a single forced tool call.
//!
//! The output schema is offered as the only tool and the provider is told
//! to call it; the tool-call arguments are the result. Servers that ignore
//! `tool_choice` and answer in prose are handled by parsing the first JSON
//! object out of the text.

use serde::de::DeserializeOwned;

use crate::AiError;
use crate::providers::{ContentBlock, LlmProvider, Message, extract_text};

/// Sends one request and deserializes the structured output of `tool`.
///
/// # Errors
///
/// * [`AiError::MissingOutput`] if neither a matching tool call nor a JSON
///   object in the text is present.
/// * [`AiError::Json`] if the output does not match `T`.
/// * Any transport/provider error from `provider`.
pub async fn request_structured<T: DeserializeOwned>(
    provider: &dyn LlmProvider,
    system_prompt: &str,
    messages: &[Message],
    tool: &serde_json::Value,
) -> Result<T, AiError> {
    let tool_name = tool["name"].as_str().unwrap_or_default();

    let response = provider
        .chat(
            system_prompt,
            messages,
            std::slice::from_ref(tool),
            Some(tool_name),
        )
        .await?;

    let tool_input = response.content.iter().find_map(|b| match b {
        ContentBlock::ToolUse { name, input, .. } if name == tool_name => Some(input.clone()),
        _ => None,
    });

    if let Some(input) = tool_input {
        return Ok(serde_json::from_value(input)?);
    }

    let text = extract_text(&response.content);
    if let Some(json) = find_json_object(&text) {
        log::debug!("{tool_name}: no tool call in response, parsing JSON from text");
        return Ok(serde_json::from_str(json)?);
    }

    Err(AiError::MissingOutput {
        tool: tool_name.to_string(),
    })
}

/// The outermost `{ ... }` span in `text`, if any.
fn find_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde::Deserialize;

    use super::*;
    use crate::providers::{LlmResponse, StopReason};

    struct OneShot {
        content: Vec<ContentBlock>,
        seen_choice: Mutex<Option<String>>,
    }

    #[async_trait::async_trait]
    impl LlmProvider for OneShot {
        async fn chat(
            &self,
            _system_prompt: &str,
            _messages: &[Message],
            _tools: &[serde_json::Value],
            tool_choice: Option<&str>,
        ) -> Result<LlmResponse, AiError> {
            *self.seen_choice.lock().unwrap() = tool_choice.map(str::to_string);
            Ok(LlmResponse {
                content: self.content.clone(),
                stop_reason: StopReason::ToolUse,
            })
        }
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Out {
        value: u32,
    }

    fn tool() -> serde_json::Value {
        serde_json::json!({ "name": "submit", "description": "", "parameters": {} })
    }

    #[tokio::test]
    async fn reads_matching_tool_call_and_forces_choice() {
        let provider = OneShot {
            content: vec![
                ContentBlock::ToolUse {
                    id: "1".to_string(),
                    name: "other".to_string(),
                    input: serde_json::json!({ "value": 1 }),
                },
                ContentBlock::ToolUse {
                    id: "2".to_string(),
                    name: "submit".to_string(),
                    input: serde_json::json!({ "value": 7 }),
                },
            ],
            seen_choice: Mutex::new(None),
        };
        let out: Out = request_structured(&provider, "sys", &[], &tool()).await.unwrap();
        assert_eq!(out, Out { value: 7 });
        assert_eq!(
            provider.seen_choice.lock().unwrap().as_deref(),
            Some("submit")
        );
    }

    #[tokio::test]
    async fn falls_back_to_json_in_text() {
        let provider = OneShot {
            content: vec![ContentBlock::Text {
                text: "Sure!\n```json\n{\"value\": 3}\n```".to_string(),
            }],
            seen_choice: Mutex::new(None),
        };
        let out: Out = request_structured(&provider, "sys", &[], &tool()).await.unwrap();
        assert_eq!(out, Out { value: 3 });
    }

    #[tokio::test]
    async fn prose_without_json_is_missing_output() {
        let provider = OneShot {
            content: vec![ContentBlock::Text {
                text: "I cannot help with that.".to_string(),
            }],
            seen_choice: Mutex::new(None),
        };
        let result: Result<Out, _> = request_structured(&provider, "sys", &[], &tool()).await;
        assert!(matches!(result, Err(AiError::MissingOutput { .. })));
    }

    #[tokio::test]
    async fn wrong_shape_is_json_error() {
        let provider = OneShot {
            content: vec![ContentBlock::ToolUse {
                id: "1".to_string(),
                name: "submit".to_string(),
                input: serde_json::json!({ "value": "lots" }),
            }],
            seen_choice: Mutex::new(None),
        };
        let result: Result<Out, _> = request_structured(&provider, "sys", &[], &tool()).await;
        assert!(matches!(result, Err(AiError::Json(_))));
    }
}
