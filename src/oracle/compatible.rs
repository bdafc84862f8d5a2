use super::http_client::build_provider_client;
use super::scrub::{api_error, scrub_secret_patterns};
use super::traits::{ChatRequest, Provider};
use super::types::{ContentBlock, MessageRole, ProviderMessage, ProviderResponse, StopReason};
use crate::tools::ToolSpec;
use anyhow::Context;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Chat-completions endpoint speaking the OpenAI wire format. DeepSeek is
/// the only configured user, but the base URL is free.
pub struct CompatibleProvider {
    name: String,
    auth_header: Option<String>,
    completions_url: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireTool<'a>>>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
}

impl WireMessage {
    fn text(role: &'static str, content: String) -> Self {
        Self {
            role,
            content: Some(content),
            tool_call_id: None,
            tool_calls: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct WireTool<'a> {
    r#type: &'static str,
    function: WireFunction<'a>,
}

#[derive(Debug, Serialize)]
struct WireFunction<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(default = "function_type")]
    r#type: String,
    function: WireCallFunction,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireCallFunction {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
    tool_calls: Option<Vec<WireToolCall>>,
}

impl CompatibleProvider {
    pub fn new(
        name: &str,
        base_url: &str,
        api_key: Option<&str>,
        timeout: Duration,
    ) -> Self {
        Self {
            name: name.to_string(),
            auth_header: api_key
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(|k| format!("Bearer {k}")),
            completions_url: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            client: build_provider_client(timeout),
        }
    }

    /// One provider message can fan out into several wire messages: tool
    /// results travel as separate `tool` role entries.
    fn wire_messages(message: &ProviderMessage) -> Vec<WireMessage> {
        let mut text_parts = Vec::new();
        let mut calls = Vec::new();
        let mut results = Vec::new();

        for block in &message.content {
            match block {
                ContentBlock::Text { text } => text_parts.push(text.as_str()),
                ContentBlock::ToolUse { id, name, input } => calls.push(WireToolCall {
                    id: id.clone(),
                    r#type: function_type(),
                    function: WireCallFunction {
                        name: name.clone(),
                        arguments: input.to_string(),
                    },
                }),
                ContentBlock::ToolResult {
                    tool_use_id,
                    content,
                    ..
                } => results.push(WireMessage {
                    role: "tool",
                    content: Some(content.clone()),
                    tool_call_id: Some(tool_use_id.clone()),
                    tool_calls: None,
                }),
            }
        }

        let text = (!text_parts.is_empty()).then(|| text_parts.join("\n"));
        let mut out = Vec::with_capacity(results.len() + 1);
        match message.role {
            MessageRole::Assistant if text.is_some() || !calls.is_empty() => {
                out.push(WireMessage {
                    role: "assistant",
                    content: text,
                    tool_call_id: None,
                    tool_calls: (!calls.is_empty()).then_some(calls),
                });
            }
            MessageRole::User => {
                if let Some(text) = text {
                    out.push(WireMessage::text("user", text));
                }
            }
            MessageRole::Assistant => {}
        }
        out.extend(results);
        out
    }

    fn map_finish_reason(reason: Option<&str>) -> StopReason {
        match reason {
            Some("stop") => StopReason::EndTurn,
            Some("tool_calls") => StopReason::ToolUse,
            Some("length") => StopReason::MaxTokens,
            Some(_) | None => StopReason::Error,
        }
    }

    fn parse_tool_calls(calls: Option<Vec<WireToolCall>>) -> anyhow::Result<Vec<ContentBlock>> {
        calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| {
                let arguments = call.function.arguments.trim();
                let input: Value = if arguments.is_empty() {
                    Value::Object(serde_json::Map::new())
                } else {
                    serde_json::from_str(arguments).with_context(|| {
                        format!("tool call arguments were not valid JSON for {}", call.function.name)
                    })?
                };
                Ok(ContentBlock::ToolUse {
                    id: call.id,
                    name: call.function.name,
                    input,
                })
            })
            .collect()
    }

    fn wire_tools(tools: &[ToolSpec]) -> Option<Vec<WireTool<'_>>> {
        (!tools.is_empty()).then(|| {
            tools
                .iter()
                .map(|t| WireTool {
                    r#type: "function",
                    function: WireFunction {
                        name: &t.name,
                        description: &t.description,
                        parameters: &t.parameters,
                    },
                })
                .collect()
        })
    }

    async fn send(&self, request: ChatRequest<'_>) -> anyhow::Result<ProviderResponse> {
        let auth_header = self.auth_header.as_deref().ok_or_else(|| {
            anyhow::anyhow!(
                "{} API key not set. Set {}_API_KEY.",
                self.name,
                self.name.to_uppercase()
            )
        })?;

        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if !request.system.is_empty() {
            messages.push(WireMessage::text(
                "system",
                scrub_secret_patterns(request.system).into_owned(),
            ));
        }
        for message in request.messages {
            messages.extend(Self::wire_messages(message));
        }

        let body = CompletionRequest {
            model: request.model,
            messages,
            temperature: request.temperature,
            tools: Self::wire_tools(request.tools),
        };

        let response = self
            .client
            .post(&self.completions_url)
            .header("Authorization", auth_header)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                anyhow::anyhow!(
                    "{} request failed: {}",
                    self.name,
                    scrub_secret_patterns(&e.to_string())
                )
            })?;

        if !response.status().is_success() {
            return Err(api_error(&self.name, response).await);
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .with_context(|| format!("{} response JSON decode failed", self.name))?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("No choices in {} response", self.name))?;

        let text = choice.message.content.unwrap_or_default();
        let mut content_blocks = Vec::new();
        if !text.is_empty() {
            content_blocks.push(ContentBlock::Text { text: text.clone() });
        }
        content_blocks.extend(Self::parse_tool_calls(choice.message.tool_calls)?);

        Ok(ProviderResponse {
            text,
            model: parsed.model,
            content_blocks,
            stop_reason: Some(Self::map_finish_reason(choice.finish_reason.as_deref())),
        })
    }
}

impl Provider for CompatibleProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn chat<'a>(
        &'a self,
        request: ChatRequest<'a>,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<ProviderResponse>> + Send + 'a>> {
        Box::pin(self.send(request))
    }
}
