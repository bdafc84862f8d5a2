use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
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
        is_error: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderMessage {
    pub role: MessageRole,
    pub content: Vec<ContentBlock>,
}

impl ProviderMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: vec![ContentBlock::Text { text: text.into() }],
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: vec![ContentBlock::Text { text: text.into() }],
        }
    }

    pub fn tool_result(
        tool_use_id: impl Into<String>,
        content: impl Into<String>,
        is_error: bool,
    ) -> Self {
        Self {
            role: MessageRole::User,
            content: vec![ContentBlock::ToolResult {
                tool_use_id: tool_use_id.into(),
                content: content.into(),
                is_error,
            }],
        }
    }

    pub fn is_plain_text(&self) -> bool {
        self.content
            .iter()
            .all(|b| matches!(b, ContentBlock::Text { .. }))
    }

    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|b| match b {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    ToolUse,
    MaxTokens,
    Error,
}

/// A provider reply, already mapped out of its wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    pub text: String,
    pub model: Option<String>,
    pub content_blocks: Vec<ContentBlock>,
    pub stop_reason: Option<StopReason>,
}

impl ProviderResponse {
    pub fn text_only(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            content_blocks: vec![ContentBlock::Text { text: text.clone() }],
            text,
            model: None,
            stop_reason: Some(StopReason::EndTurn),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn tool_calls(&self) -> Vec<ToolCall> {
        self.content_blocks
            .iter()
            .filter_map(|block| match block {
                ContentBlock::ToolUse { id, name, input } => Some(ToolCall {
                    id: id.clone(),
                    name: name.clone(),
                    input: input.clone(),
                }),
                _ => None,
            })
            .collect()
    }
}

/// One tool invocation requested by the oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub input: serde_json::Value,
}

/// Provider-independent result of one oracle round.
#[derive(Debug, Clone, PartialEq)]
pub enum OracleTurn {
    /// The oracle wants side effects before it answers. `text` is whatever it
    /// said alongside the calls, possibly empty.
    ToolCalls { text: String, calls: Vec<ToolCall> },
    Final(String),
}

impl OracleTurn {
    pub fn from_response(response: &ProviderResponse) -> Self {
        let calls = response.tool_calls();
        if calls.is_empty() {
            Self::Final(response.text.clone())
        } else {
            Self::ToolCalls {
                text: response.text.clone(),
                calls,
            }
        }
    }

    /// The assistant message to replay into history before tool results.
    pub fn to_assistant_message(&self) -> ProviderMessage {
        match self {
            Self::Final(text) => ProviderMessage::assistant(text.clone()),
            Self::ToolCalls { text, calls } => {
                let mut content = Vec::with_capacity(calls.len() + 1);
                if !text.is_empty() {
                    content.push(ContentBlock::Text { text: text.clone() });
                }
                content.extend(calls.iter().map(|c| ContentBlock::ToolUse {
                    id: c.id.clone(),
                    name: c.name.clone(),
                    input: c.input.clone(),
                }));
                ProviderMessage {
                    role: MessageRole::Assistant,
                    content,
                }
            }
        }
    }
}
