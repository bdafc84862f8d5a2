use chrono::{DateTime, Local};
use std::future::Future;
use std::pin::Pin;

pub type ChannelFuture<'a, T> = Pin<Box<dyn Future<Output = anyhow::Result<T>> + Send + 'a>>;

/// A message received from a channel.
///
/// `sender` identifies the user (e.g. Telegram user id); replies go back to
/// the same id.
#[derive(Debug, Clone)]
pub struct ChannelMessage {
    pub id: String,
    pub sender: String,
    pub content: String,
    pub channel: String,
    pub timestamp: DateTime<Local>,
}

impl ChannelMessage {
    pub fn new(
        sender: impl Into<String>,
        content: impl Into<String>,
        channel: impl Into<String>,
        timestamp: DateTime<Local>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            sender: sender.into(),
            content: content.into(),
            channel: channel.into(),
            timestamp,
        }
    }
}

/// Core channel trait, one implementation per transport.
pub trait Channel: Send + Sync {
    fn name(&self) -> &str;

    /// Send one message.
    fn send<'a>(&'a self, message: &'a str, recipient: &'a str) -> ChannelFuture<'a, ()>;

    /// Listen for inbound messages until the transport closes (long-running).
    fn listen<'a>(
        &'a self,
        tx: tokio::sync::mpsc::Sender<ChannelMessage>,
    ) -> ChannelFuture<'a, ()>;

    /// Where proactive messages go when nobody has written yet.
    fn default_recipient(&self) -> Option<&str> {
        None
    }

    fn send_typing<'a>(&'a self, _recipient: &'a str) -> ChannelFuture<'a, ()> {
        Box::pin(async { Ok(()) })
    }

    fn health_check<'a>(&'a self) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>> {
        Box::pin(async { true })
    }
}
