use super::traits::{Channel, ChannelFuture, ChannelMessage};
use chrono::Local;
use reqwest::Client;
use serde::Deserialize;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

const DEFAULT_API_BASE: &str = "https://api.telegram.org";
const LONG_POLL_SECS: u64 = 30;
const RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct UpdatesResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    result: Vec<Update>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    #[serde(default)]
    message: Option<IncomingMessage>,
}

#[derive(Debug, Deserialize)]
struct IncomingMessage {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    from: Option<Peer>,
    chat: Peer,
}

#[derive(Debug, Deserialize)]
struct Peer {
    id: i64,
}

/// Telegram Bot API over long polling. Only one user id is ever served.
pub struct TelegramChannel {
    bot_token: String,
    allowed_user_id: Option<String>,
    api_base: String,
    poll_timeout_secs: u64,
    client: Client,
}

impl TelegramChannel {
    pub fn new(bot_token: impl Into<String>, allowed_user_id: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(LONG_POLL_SECS + 15))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Falling back to default HTTP client: {e}");
                Client::new()
            });
        Self {
            bot_token: bot_token.into(),
            allowed_user_id: allowed_user_id
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty()),
            api_base: DEFAULT_API_BASE.to_string(),
            poll_timeout_secs: LONG_POLL_SECS,
            client,
        }
    }

    /// Point at a different Bot API host (a local server, or a mock in tests).
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_poll_timeout(mut self, secs: u64) -> Self {
        self.poll_timeout_secs = secs;
        self
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_base, self.bot_token)
    }

    fn is_user_allowed(&self, user_id: &str) -> bool {
        self.allowed_user_id.as_deref() == Some(user_id)
    }

    async fn post_checked(&self, method: &str, body: serde_json::Value) -> anyhow::Result<()> {
        let resp = self
            .client
            .post(self.api_url(method))
            .json(&body)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Telegram {method} request failed: {}", scrub(&e)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let err = resp
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read response body: {e}>"));
            anyhow::bail!(
                "Telegram {method} failed ({status}): {}",
                crate::oracle::scrub::sanitize_api_error(&err)
            );
        }
        Ok(())
    }

    async fn poll(&self, offset: i64) -> anyhow::Result<Vec<Update>> {
        let body = serde_json::json!({
            "offset": offset,
            "timeout": self.poll_timeout_secs,
            "allowed_updates": ["message"]
        });
        let resp = self
            .client
            .post(self.api_url("getUpdates"))
            .json(&body)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("poll request failed: {}", scrub(&e)))?;
        let data: UpdatesResponse = resp
            .json()
            .await
            .map_err(|e| anyhow::anyhow!("poll parse failed: {}", scrub(&e)))?;
        if !data.ok {
            anyhow::bail!(
                "getUpdates rejected: {}",
                data.description.as_deref().unwrap_or("no description")
            );
        }
        Ok(data.result)
    }

    /// Turn one update into an inbound message, or `None` if it should be
    /// dropped (not text, or not from the authorized user).
    fn accept_update(&self, update: Update) -> Option<ChannelMessage> {
        let message = update.message?;
        let text = message.text?;
        let user_id = message.from.map(|f| f.id.to_string());
        let Some(user_id) = user_id.filter(|id| self.is_user_allowed(id)) else {
            tracing::warn!(
                update_id = update.update_id,
                chat_id = message.chat.id,
                "Telegram: ignoring message from unauthorized user"
            );
            return None;
        };
        tracing::debug!(user_id = %user_id, "Telegram message accepted");
        Some(ChannelMessage::new(
            message.chat.id.to_string(),
            text,
            "telegram",
            Local::now(),
        ))
    }
}

fn scrub(e: &impl std::fmt::Display) -> String {
    crate::oracle::scrub_secret_patterns(&e.to_string()).into_owned()
}

impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    fn send<'a>(&'a self, message: &'a str, recipient: &'a str) -> ChannelFuture<'a, ()> {
        Box::pin(async move {
            self.post_checked(
                "sendMessage",
                serde_json::json!({ "chat_id": recipient, "text": message }),
            )
            .await
        })
    }

    fn listen<'a>(
        &'a self,
        tx: tokio::sync::mpsc::Sender<ChannelMessage>,
    ) -> ChannelFuture<'a, ()> {
        Box::pin(async move {
            let mut offset: i64 = 0;
            tracing::info!("Telegram channel listening for messages...");

            loop {
                let updates = match self.poll(offset).await {
                    Ok(updates) => updates,
                    Err(e) => {
                        tracing::warn!("Telegram poll error: {e}");
                        tokio::time::sleep(RETRY_DELAY).await;
                        continue;
                    }
                };

                for update in updates {
                    offset = offset.max(update.update_id + 1);
                    let Some(msg) = self.accept_update(update) else {
                        continue;
                    };
                    if tx.send(msg).await.is_err() {
                        return Ok(());
                    }
                }
            }
        })
    }

    fn default_recipient(&self) -> Option<&str> {
        self.allowed_user_id.as_deref()
    }

    fn send_typing<'a>(&'a self, recipient: &'a str) -> ChannelFuture<'a, ()> {
        Box::pin(async move {
            self.post_checked(
                "sendChatAction",
                serde_json::json!({ "chat_id": recipient, "action": "typing" }),
            )
            .await
        })
    }

    fn health_check<'a>(&'a self) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>> {
        Box::pin(async move {
            self.client
                .get(self.api_url("getMe"))
                .send()
                .await
                .map(|r| r.status().is_success())
                .unwrap_or(false)
        })
    }
}
