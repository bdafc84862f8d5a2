use super::traits::Channel;
use crate::config::ConversationConfig;
use crate::error::TransportError;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

/// Random pause between consecutive outbound lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    min: Duration,
    max: Duration,
}

impl Pacing {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            min: min.min(max),
            max: max.max(min),
        }
    }

    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub fn from_config(config: &ConversationConfig) -> Self {
        Self::new(
            Duration::from_millis(config.min_line_delay_ms),
            Duration::from_millis(config.max_line_delay_ms),
        )
    }

    pub fn delay(&self) -> Duration {
        if self.max.is_zero() || self.min == self.max {
            return self.min;
        }
        let ms = rand::rng().random_range(self.min.as_millis()..=self.max.as_millis());
        Duration::from_millis(u64::try_from(ms).unwrap_or(u64::MAX))
    }
}

/// Sends paced, typing-indicated lines through one channel. Callers hold the
/// coordinator's dispatch slot while calling [`Outbound::send_lines`].
pub struct Outbound {
    channel: Arc<dyn Channel>,
    pacing: Pacing,
}

impl Outbound {
    pub fn new(channel: Arc<dyn Channel>, pacing: Pacing) -> Self {
        Self { channel, pacing }
    }

    pub fn channel_name(&self) -> &str {
        self.channel.name()
    }

    pub fn default_recipient(&self) -> Option<&str> {
        self.channel.default_recipient()
    }

    /// Send each line as its own message. Typing failures are ignored; a
    /// failed send stops the batch.
    pub async fn send_lines(&self, recipient: &str, lines: &[String]) -> Result<(), TransportError> {
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                if let Err(e) = self.channel.send_typing(recipient).await {
                    tracing::debug!(channel = self.channel.name(), error = %e, "Typing indicator failed");
                }
                let pause = self.pacing.delay();
                if !pause.is_zero() {
                    tokio::time::sleep(pause).await;
                }
            }
            self.channel
                .send(line, recipient)
                .await
                .map_err(|e| TransportError::Send {
                    channel: self.channel.name().to_string(),
                    message: crate::oracle::scrub_secret_patterns(&e.to_string()).into_owned(),
                })?;
        }
        Ok(())
    }

    pub async fn typing(&self, recipient: &str) {
        if let Err(e) = self.channel.send_typing(recipient).await {
            tracing::debug!(channel = self.channel.name(), error = %e, "Typing indicator failed");
        }
    }
}
