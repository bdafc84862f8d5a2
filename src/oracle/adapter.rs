use super::profile::{OracleMode, ProviderProfile};
use super::scrub::scrub_secret_patterns;
use super::traits::{ChatRequest, Provider};
use super::types::{ContentBlock, MessageRole, OracleTurn, ProviderMessage};
use crate::error::OracleError;
use crate::tools::ToolSpec;
use std::sync::Arc;
use std::time::Duration;

/// Placeholder user turn used when a conversation opens with the agent
/// speaking; providers require the first message to come from the user.
const CONTINUATION_MARKER: &str = "(conversation continues)";

/// Uniform request/response contract over one configured provider.
pub struct DecisionOracle {
    provider: Arc<dyn Provider>,
    profile: ProviderProfile,
    mode: OracleMode,
    temperature: f64,
    timeout: Duration,
}

impl DecisionOracle {
    pub fn new(
        provider: Arc<dyn Provider>,
        profile: ProviderProfile,
        mode: OracleMode,
        temperature: f64,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            profile,
            mode,
            temperature,
            timeout,
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn mode(&self) -> OracleMode {
        self.mode
    }

    /// One oracle round: the provider either asks for tool calls or answers.
    pub async fn converse(
        &self,
        system: &str,
        history: &[ProviderMessage],
        tools: &[ToolSpec],
    ) -> Result<OracleTurn, OracleError> {
        let system = self.profile.apply(system);
        let messages = normalize_history(history);
        let request = ChatRequest {
            system: &system,
            messages: &messages,
            tools,
            model: &self.profile.model,
            temperature: self.temperature,
        };

        let provider = self.provider.name().to_string();
        let response = match tokio::time::timeout(self.timeout, self.provider.chat(request)).await
        {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                return Err(OracleError::Request {
                    provider,
                    message: scrub_secret_patterns(&format!("{e:#}")).into_owned(),
                });
            }
            Err(_) => {
                return Err(OracleError::Timeout {
                    provider,
                    secs: self.timeout.as_secs(),
                });
            }
        };

        tracing::debug!(
            provider = %provider,
            mode = %self.mode,
            model = response.model.as_deref().unwrap_or(&self.profile.model),
            stop_reason = ?response.stop_reason,
            "oracle round complete"
        );
        Ok(OracleTurn::from_response(&response))
    }
}

/// Merge consecutive same-role plain-text messages and make sure the
/// conversation opens and ends with a user turn. Messages carrying tool blocks are
/// never merged; their pairing with tool results must survive intact.
pub fn normalize_history(history: &[ProviderMessage]) -> Vec<ProviderMessage> {
    let mut out: Vec<ProviderMessage> = Vec::with_capacity(history.len() + 1);
    for message in history {
        if let Some(last) = out.last_mut()
            && last.role == message.role
            && last.is_plain_text()
            && message.is_plain_text()
        {
            let merged = format!("{}\n{}", last.text(), message.text());
            last.content = vec![ContentBlock::Text { text: merged }];
            continue;
        }
        out.push(message.clone());
    }

    if out.first().is_some_and(|m| m.role == MessageRole::Assistant) {
        out.insert(0, ProviderMessage::user(CONTINUATION_MARKER));
    }
    // A user entry stamped before a late agent message can leave the agent last.
    if out
        .last()
        .is_some_and(|m| m.role == MessageRole::Assistant && m.is_plain_text())
    {
        out.push(ProviderMessage::user(CONTINUATION_MARKER));
    }
    out
}
