use super::http_client::build_provider_client;
use super::scrub::{api_error, scrub_secret_patterns};
use super::traits::{ChatRequest, Provider};
use super::types::{ContentBlock, MessageRole, ProviderMessage, ProviderResponse, StopReason};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 2048;

/// Anthropic Messages API.
pub struct AnthropicProvider {
    api_key: Option<String>,
    messages_url: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "str::is_empty")]
    system: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool<'a>>,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: Vec<WireBlock>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        is_error: bool,
    },
}

#[derive(Debug, Serialize)]
struct WireTool<'a> {
    name: &'a str,
    description: &'a str,
    input_schema: &'a serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ResponseBlock>,
    stop_reason: Option<String>,
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    #[serde(other)]
    Unsupported,
}

impl AnthropicProvider {
    pub fn new(api_key: Option<&str>, base_url: Option<&str>, timeout: Duration) -> Self {
        let base = base_url
            .map_or(DEFAULT_BASE_URL, |u| u.trim_end_matches('/'))
            .to_string();
        Self {
            api_key: api_key
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(ToString::to_string),
            messages_url: format!("{base}/v1/messages"),
            client: build_provider_client(timeout),
        }
    }

    fn wire_message(message: &ProviderMessage) -> WireMessage {
        let role = match message.role {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        };
        let content = message
            .content
            .iter()
            .map(|block| match block {
                ContentBlock::Text { text } => WireBlock::Text { text: text.clone() },
                ContentBlock::ToolUse { id, name, input } => WireBlock::ToolUse {
                    id: id.clone(),
                    name: name.clone(),
                    input: input.clone(),
                },
                ContentBlock::ToolResult {
                    tool_use_id,
                    content,
                    is_error,
                } => WireBlock::ToolResult {
                    tool_use_id: tool_use_id.clone(),
                    content: content.clone(),
                    is_error: *is_error,
                },
            })
            .collect();
        WireMessage { role, content }
    }

    fn map_stop_reason(reason: Option<&str>) -> Option<StopReason> {
        reason.map(|r| match r {
            "end_turn" | "stop_sequence" => StopReason::EndTurn,
            "tool_use" => StopReason::ToolUse,
            "max_tokens" => StopReason::MaxTokens,
            _ => StopReason::Error,
        })
    }

    fn into_response(body: MessagesResponse) -> ProviderResponse {
        let content_blocks: Vec<ContentBlock> = body
            .content
            .into_iter()
            .filter_map(|block| match block {
                ResponseBlock::Text { text } => Some(ContentBlock::Text { text }),
                ResponseBlock::ToolUse { id, name, input } => {
                    Some(ContentBlock::ToolUse { id, name, input })
                }
                ResponseBlock::Unsupported => None,
            })
            .collect();
        let text = content_blocks
            .iter()
            .filter_map(|b| match b {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n");

        ProviderResponse {
            text,
            model: body.model,
            content_blocks,
            stop_reason: Self::map_stop_reason(body.stop_reason.as_deref()),
        }
    }

    async fn send(&self, request: ChatRequest<'_>) -> anyhow::Result<ProviderResponse> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("Anthropic API key not set. Set ANTHROPIC_API_KEY."))?;

        let system = scrub_secret_patterns(request.system);
        let body = MessagesRequest {
            model: request.model,
            max_tokens: MAX_TOKENS,
            system: &system,
            messages: request.messages.iter().map(Self::wire_message).collect(),
            tools: request
                .tools
                .iter()
                .map(|t| WireTool {
                    name: &t.name,
                    description: &t.description,
                    input_schema: &t.parameters,
                })
                .collect(),
            temperature: request.temperature,
        };

        let response = self
            .client
            .post(&self.messages_url)
            .header("anthropic-version", API_VERSION)
            .header("x-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Anthropic request failed: {}", scrub_secret_patterns(&e.to_string())))?;

        if !response.status().is_success() {
            return Err(api_error("Anthropic", response).await);
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| anyhow::anyhow!("Anthropic response JSON decode failed: {e}"))?;
        Ok(Self::into_response(parsed))
    }
}

impl Provider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn chat<'a>(
        &'a self,
        request: ChatRequest<'a>,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<ProviderResponse>> + Send + 'a>> {
        Box::pin(self.send(request))
    }
}
