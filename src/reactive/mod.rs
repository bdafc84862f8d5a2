//! Reactive path: inbound messages, debounced into conversation turns.

pub mod commands;
pub mod debounce;
pub mod duration;
pub mod handler;

pub use commands::{Command, SessionCommand};
pub use debounce::{collect_burst, combine};
pub use duration::parse_duration_minutes;
pub use handler::{ReactiveHandler, TurnReport};

use crate::channels::ChannelMessage;
use crate::shared::Shared;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

/// What the intake did with one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accepted {
    /// Answered directly as a command.
    Command(Command),
    /// Queued for the next conversation turn; the interaction signal is up.
    Queued,
    /// Queued as a turn driven by the command's canned prompt.
    Session(SessionCommand),
}

/// First stop for inbound messages: raises the interaction signal before
/// anything is buffered, and answers slash commands on the spot.
pub struct Intake {
    shared: Shared,
    queue: mpsc::Sender<ChannelMessage>,
}

impl Intake {
    pub fn new(shared: Shared, queue: mpsc::Sender<ChannelMessage>) -> Self {
        Self { shared, queue }
    }

    pub async fn accept(&self, message: ChannelMessage) -> anyhow::Result<Accepted> {
        if let Some(command) = Command::parse(&message.content) {
            let reply = command.execute(&self.shared.history, &self.shared.gateway);
            let _slot = self.shared.coordinator.dispatch_slot().await;
            self.shared
                .outbound
                .send_lines(&message.sender, &[reply])
                .await?;
            return Ok(Accepted::Command(command));
        }

        let session = SessionCommand::parse(&message.content);
        let message = match session {
            Some(command) => {
                tracing::info!(command = %command, "Session command");
                ChannelMessage {
                    content: command.prompt().to_string(),
                    ..message
                }
            }
            None => message,
        };

        let ticket = self.shared.coordinator.ticket();
        self.queue
            .send(message)
            .await
            .map_err(|_| anyhow::anyhow!("reactive queue closed"))?;
        ticket.into_pending();
        Ok(session.map_or(Accepted::Queued, Accepted::Session))
    }

    /// Feed everything a channel listener produces through [`Intake::accept`].
    pub async fn route(
        self: Arc<Self>,
        inbound: Arc<Mutex<mpsc::Receiver<ChannelMessage>>>,
    ) -> anyhow::Result<()> {
        let mut rx = inbound.lock().await;
        while let Some(message) = rx.recv().await {
            tracing::debug!(channel = %message.channel, id = %message.id, "Inbound message");
            if let Err(e) = self.accept(message).await {
                tracing::warn!(error = %e, "Inbound message not accepted");
            }
        }
        anyhow::bail!("inbound channel closed")
    }
}
