use super::debounce::{collect_burst, combine};
use super::duration::parse_duration_minutes;
use crate::agent::{ToolLoop, ToolLoopResult};
use crate::agent::postprocess::{mentions_acknowledgment, outbound_lines, strip_ack_lines};
use crate::channels::ChannelMessage;
use crate::config::{AckRemediation, Config, ConversationConfig};
use crate::history::{HistoryEntry, Role};
use crate::oracle::{DecisionOracle, ProviderMessage};
use crate::persona::{PROFILE_PATH, PROTOCOL_PATH};
use crate::shared::Shared;
use crate::tools::ToolRegistry;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

const ACK_CORRECTION: &str = "You said something was saved, but no write_knowledge call \
succeeded this turn. Call write_knowledge now, or answer again without claiming it was saved.";

/// What one reactive turn did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReport {
    pub consumed: usize,
    pub lines: Vec<String>,
    /// The configured fallback went out instead of an oracle answer.
    pub fallback: bool,
    pub working_minutes: Option<i64>,
    pub delivered: bool,
}

/// Consumes inbound bursts and runs full conversation turns.
pub struct ReactiveHandler {
    shared: Shared,
    oracle: DecisionOracle,
    tool_loop: ToolLoop,
    conversation: ConversationConfig,
}

impl ReactiveHandler {
    pub fn new(config: &Config, shared: Shared, oracle: DecisionOracle) -> Self {
        let registry = Arc::new(ToolRegistry::conversation(
            Arc::clone(&shared.gateway),
            Arc::clone(&shared.clock),
        ));
        Self {
            tool_loop: ToolLoop::new(registry, config.conversation.max_tool_iterations),
            conversation: config.conversation.clone(),
            shared,
            oracle,
        }
    }

    fn to_provider_messages(entries: &[HistoryEntry]) -> Vec<ProviderMessage> {
        entries
            .iter()
            .map(|entry| match entry.role {
                Role::User => ProviderMessage::user(entry.annotated()),
                Role::Agent => ProviderMessage::assistant(entry.annotated()),
            })
            .collect()
    }

    /// Invalidate the cached persona when the turn rewrote one of its files.
    async fn refresh_persona(&self, result: &ToolLoopResult) {
        let touched = result.written_paths().any(|raw| {
            self.shared
                .gateway
                .normalize(raw)
                .is_ok_and(|path| path == PROTOCOL_PATH || path == PROFILE_PATH)
        });
        if touched {
            self.shared.persona.reload().await;
        }
    }

    /// The oracle's reply text, or `None` if the oracle failed.
    async fn converse(&self, system: &str) -> Option<String> {
        let messages = Self::to_provider_messages(&self.shared.history.snapshot());
        let result = match self.tool_loop.run(&self.oracle, system, messages).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(provider = self.oracle.provider_name(), error = %e, "Reactive oracle call failed");
                return None;
            }
        };

        self.refresh_persona(&result).await;
        let text = result.final_text.clone();
        if text.trim().is_empty() || !mentions_acknowledgment(&text) || result.wrote_this_turn() {
            return Some(text);
        }

        match self.conversation.ack_remediation {
            AckRemediation::Warn => {
                tracing::warn!("Reply acknowledges a save but nothing was written");
                Some(text)
            }
            AckRemediation::Strip => {
                tracing::warn!("Stripping unbacked acknowledgment from reply");
                Some(strip_ack_lines(&text))
            }
            AckRemediation::Retry => {
                tracing::warn!("Reply acknowledges a save but nothing was written, retrying once");
                let mut messages = result.messages;
                messages.push(ProviderMessage::user(ACK_CORRECTION));
                match self.tool_loop.run(&self.oracle, system, messages).await {
                    Ok(retry) if !retry.final_text.trim().is_empty() => {
                        self.refresh_persona(&retry).await;
                        if mentions_acknowledgment(&retry.final_text) && !retry.wrote_this_turn() {
                            tracing::warn!("Retry still acknowledges without writing");
                        }
                        Some(retry.final_text)
                    }
                    Ok(_) => Some(text),
                    Err(e) => {
                        tracing::warn!(error = %e, "Acknowledgment retry failed, keeping first reply");
                        Some(text)
                    }
                }
            }
        }
    }

    /// Run one turn for a debounced burst. Does not release the interaction
    /// signal; the consumer holds a release guard for `consumed` messages.
    pub async fn handle_turn(&self, burst: &[ChannelMessage]) -> TurnReport {
        let consumed = burst.len();
        let text = combine(burst);
        let recipient = burst
            .last()
            .map(|m| m.sender.clone())
            .or_else(|| self.shared.outbound.default_recipient().map(str::to_string))
            .unwrap_or_default();
        let now = self.shared.clock.now();

        let working_minutes = parse_duration_minutes(&text)
            .filter(|m| *m >= self.conversation.min_working_minutes);
        let deadline = working_minutes.and_then(|minutes| {
            chrono::TimeDelta::try_minutes(minutes).and_then(|d| now.checked_add_signed(d))
        });
        if let (Some(minutes), Some(until)) = (working_minutes, deadline) {
            self.shared
                .session
                .update(|state| state.working_until = Some(until))
                .await;
            tracing::info!(minutes, until = %until.format("%H:%M"), "Working deadline set");
        }

        let system = self.shared.persona.system_context().await;
        // Stamp the user entry with arrival time; a burst left over from
        // yesterday lands at the start of the current turn instead.
        let arrived = burst
            .first()
            .map(|m| m.timestamp)
            .filter(|at| at.date_naive() == now.date_naive() && *at <= now)
            .unwrap_or(now);
        self.shared.history.append(Role::User, text, arrived);
        self.shared.outbound.typing(&recipient).await;

        let reply = self.converse(&system).await;
        let mut lines = reply
            .as_deref()
            .map(|r| outbound_lines(r, self.conversation.max_outbound_lines))
            .unwrap_or_default();
        let fallback = lines.is_empty();
        if fallback {
            lines = vec![self.conversation.fallback_reply.clone()];
        }

        let delivered = {
            let _slot = self.shared.coordinator.dispatch_slot().await;
            match self.shared.outbound.send_lines(&recipient, &lines).await {
                Ok(()) => true,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to deliver reply");
                    false
                }
            }
        };

        let done = self.shared.clock.now();
        self.shared
            .session
            .update(|state| state.record_interaction(done))
            .await;
        if !fallback {
            self.shared.history.append(Role::Agent, lines.join("\n"), done);
        }

        TurnReport {
            consumed,
            lines,
            fallback,
            working_minutes,
            delivered,
        }
    }

    /// Consume the queue forever: debounce, run a turn, release the signal.
    pub async fn run(
        self: Arc<Self>,
        queue: Arc<Mutex<mpsc::Receiver<ChannelMessage>>>,
    ) -> anyhow::Result<()> {
        let mut rx = queue.lock().await;
        let window = self.conversation.debounce();
        while let Some(burst) = collect_burst(&mut rx, window).await {
            tracing::info!(messages = burst.len(), "Processing inbound burst");
            let _release = self.shared.coordinator.release_on_drop(burst.len());
            let report = self.handle_turn(&burst).await;
            tracing::info!(
                lines = report.lines.len(),
                fallback = report.fallback,
                delivered = report.delivered,
                "Reactive turn complete"
            );
        }
        anyhow::bail!("inbound queue closed")
    }
}
