//! AWS Bedrock provider implementation using the Converse API.

use aws_sdk_bedrockruntime::types::{
    self as bedrock, ContentBlock as BedrockContent, ConversationRole, ImageFormat, ImageSource,
    Message as BedrockMessage, SpecificToolChoice, StopReason as BedrockStopReason,
    SystemContentBlock, Tool, ToolChoice, ToolConfiguration, ToolInputSchema, ToolSpecification,
};
use aws_smithy_types::{Blob, Document};
use base64::Engine as _;

use super::{ContentBlock, LlmProvider, LlmResponse, Message, MessageContent, StopReason};
use crate::AiError;

/// AWS Bedrock provider using the Converse API.
///
/// Works with any Bedrock model that supports tool use and image input
/// (Claude, Llama 3.2 vision, Nova). Authentication uses the standard AWS
/// credential chain (env vars, IAM role, `~/.aws/credentials`).
pub struct BedrockProvider {
    client: aws_sdk_bedrockruntime::Client,
    model_id: String,
}

impl BedrockProvider {
    /// Creates a new Bedrock provider.
    ///
    /// Loads AWS configuration from the environment (region, credentials).
    pub async fn new(model_id: String, region: Option<String>) -> Self {
        let mut config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest());

        if let Some(region) = region {
            config_loader = config_loader.region(aws_config::Region::new(region));
        }

        let config = config_loader.load().await;
        let client = aws_sdk_bedrockruntime::Client::new(&config);

        Self { client, model_id }
    }
}

fn provider_error(context: &str, e: impl std::fmt::Display) -> AiError {
    AiError::Provider {
        message: format!("{context}: {e}"),
    }
}

#[async_trait::async_trait]
impl LlmProvider for BedrockProvider {
    async fn chat(
        &self,
        system_prompt: &str,
        messages: &[Message],
        tools: &[serde_json::Value],
        tool_choice: Option<&str>,
    ) -> Result<LlmResponse, AiError> {
        let bedrock_messages = convert_messages(messages)?;

        let mut request = self
            .client
            .converse()
            .model_id(&self.model_id)
            .system(SystemContentBlock::Text(system_prompt.to_string()))
            .set_messages(Some(bedrock_messages))
            .inference_config(
                bedrock::InferenceConfiguration::builder()
                    .max_tokens(4096)
                    .build(),
            );

        if !tools.is_empty() {
            request = request.tool_config(convert_tools(tools, tool_choice)?);
        }

        let response = request
            .send()
            .await
            .map_err(|e| provider_error("Bedrock Converse error", e))?;

        let output = response.output().ok_or_else(|| AiError::Provider {
            message: "No output in Bedrock response".to_string(),
        })?;

        let bedrock::ConverseOutput::Message(response_msg) = output else {
            return Err(AiError::Provider {
                message: "Unexpected Bedrock output variant".to_string(),
            });
        };

        let mut content_blocks = Vec::new();
        for block in response_msg.content() {
            match block {
                BedrockContent::Text(text) => {
                    content_blocks.push(ContentBlock::Text { text: text.clone() });
                }
                BedrockContent::ToolUse(tool_use) => {
                    content_blocks.push(ContentBlock::ToolUse {
                        id: tool_use.tool_use_id().to_string(),
                        name: tool_use.name().to_string(),
                        input: document_to_json(tool_use.input()),
                    });
                }
                _ => {}
            }
        }

        let stop_reason = match response.stop_reason() {
            BedrockStopReason::ToolUse => StopReason::ToolUse,
            BedrockStopReason::MaxTokens => StopReason::MaxTokens,
            _ => StopReason::EndTurn,
        };

        Ok(LlmResponse {
            content: content_blocks,
            stop_reason,
        })
    }
}

/// Converts our internal messages to Bedrock `Message` format.
fn convert_messages(messages: &[Message]) -> Result<Vec<BedrockMessage>, AiError> {
    messages
        .iter()
        .map(|msg| {
            let role = match msg.role.as_str() {
                "user" => ConversationRole::User,
                "assistant" => ConversationRole::Assistant,
                other => {
                    return Err(AiError::Provider {
                        message: format!("Unsupported message role for Bedrock: {other}"),
                    });
                }
            };

            let content = match &msg.content {
                MessageContent::Text(text) => vec![BedrockContent::Text(text.clone())],
                MessageContent::Blocks(blocks) => blocks
                    .iter()
                    .map(convert_block)
                    .collect::<Result<Vec<_>, _>>()?,
            };

            BedrockMessage::builder()
                .role(role)
                .set_content(Some(content))
                .build()
                .map_err(|e| provider_error("Failed to build Bedrock Message", e))
        })
        .collect()
}

fn convert_block(block: &ContentBlock) -> Result<BedrockContent, AiError> {
    match block {
        ContentBlock::Text { text } => Ok(BedrockContent::Text(text.clone())),
        ContentBlock::Image { media_type, data } => {
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(data)
                .map_err(|e| provider_error("Invalid image payload", e))?;
            let format = media_type.strip_prefix("image/").unwrap_or(media_type);
            let image = bedrock::ImageBlock::builder()
                .format(ImageFormat::from(format))
                .source(ImageSource::Bytes(Blob::new(bytes)))
                .build()
                .map_err(|e| provider_error("Failed to build ImageBlock", e))?;
            Ok(BedrockContent::Image(image))
        }
        ContentBlock::ToolUse { id, name, input } => {
            let tool_use = bedrock::ToolUseBlock::builder()
                .tool_use_id(id.as_str())
                .name(name.as_str())
                .input(json_to_document(input))
                .build()
                .map_err(|e| provider_error("Failed to build ToolUseBlock", e))?;
            Ok(BedrockContent::ToolUse(tool_use))
        }
    }
}

/// Converts our JSON tool definitions to a Bedrock `ToolConfiguration`,
/// forcing `tool_choice` when given.
fn convert_tools(
    tools: &[serde_json::Value],
    tool_choice: Option<&str>,
) -> Result<ToolConfiguration, AiError> {
    let bedrock_tools: Vec<Tool> = tools
        .iter()
        .filter_map(|t| {
            let name = t["name"].as_str()?;
            let description = t["description"].as_str().unwrap_or("");
            let spec = ToolSpecification::builder()
                .name(name)
                .description(description)
                .input_schema(ToolInputSchema::Json(json_to_document(&t["parameters"])))
                .build()
                .ok()?;
            Some(Tool::ToolSpec(spec))
        })
        .collect();

    let mut builder = ToolConfiguration::builder().set_tools(Some(bedrock_tools));

    if let Some(name) = tool_choice {
        let specific = SpecificToolChoice::builder()
            .name(name)
            .build()
            .map_err(|e| provider_error("Failed to build SpecificToolChoice", e))?;
        builder = builder.tool_choice(ToolChoice::Tool(specific));
    }

    builder
        .build()
        .map_err(|e| provider_error("Failed to build ToolConfiguration", e))
}

/// Converts a `serde_json::Value` to an `aws_smithy_types::Document`.
fn json_to_document(value: &serde_json::Value) -> Document {
    match value {
        serde_json::Value::Null => Document::Null,
        serde_json::Value::Bool(b) => Document::Bool(*b),
        serde_json::Value::Number(n) => n.as_u64().map_or_else(
            || {
                n.as_i64().map_or_else(
                    || Document::Number(aws_smithy_types::Number::Float(n.as_f64().unwrap_or(0.0))),
                    |i| Document::Number(aws_smithy_types::Number::NegInt(i)),
                )
            },
            |u| Document::Number(aws_smithy_types::Number::PosInt(u)),
        ),
        serde_json::Value::String(s) => Document::String(s.clone()),
        serde_json::Value::Array(arr) => {
            Document::Array(arr.iter().map(json_to_document).collect())
        }
        serde_json::Value::Object(obj) => Document::Object(
            obj.iter()
                .map(|(k, v)| (k.clone(), json_to_document(v)))
                .collect(),
        ),
    }
}

/// Converts an `aws_smithy_types::Document` to a `serde_json::Value`.
fn document_to_json(doc: &Document) -> serde_json::Value {
    match doc {
        Document::Null => serde_json::Value::Null,
        Document::Bool(b) => serde_json::Value::Bool(*b),
        Document::Number(n) => match *n {
            aws_smithy_types::Number::PosInt(i) => serde_json::json!(i),
            aws_smithy_types::Number::NegInt(i) => serde_json::json!(i),
            aws_smithy_types::Number::Float(f) => serde_json::Number::from_f64(f)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
        },
        Document::String(s) => serde_json::Value::String(s.clone()),
        Document::Array(arr) => serde_json::Value::Array(arr.iter().map(document_to_json).collect()),
        Document::Object(obj) => serde_json::Value::Object(
            obj.iter()
                .map(|(k, v)| (k.clone(), document_to_json(v)))
                .collect(),
        ),
    }
}
