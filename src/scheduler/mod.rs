//! Proactive path: randomized ticks that ask the oracle whether to message
//! the user, plus fixed cron check-ins.

pub mod checkins;
pub mod context;
pub mod decision;
pub mod window;

pub use checkins::{Checkin, CheckinPlan};
pub use decision::{Decision, DecisionError, parse_decision};
pub use window::{QuietWindow, TickInterval};

use crate::agent::ToolLoop;
use crate::config::Config;
use crate::history::Role;
use crate::oracle::{DecisionOracle, ProviderMessage};
use crate::shared::Shared;
use crate::tools::ToolRegistry;
use chrono::{DateTime, Local};
use std::sync::Arc;
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SuppressReason {
    QuietHours,
    UserInteracting,
    Cooldown,
    WorkingUntil,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SkipReason {
    Declined,
    MalformedDecision,
    OracleFailure,
    EmptyMessage,
    DispatchFailed,
}

/// How one tick (or check-in) ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Suppressed(SuppressReason),
    Skipped(SkipReason),
    Sent { message: String },
}

impl TickOutcome {
    pub fn was_sent(&self) -> bool {
        matches!(self, Self::Sent { .. })
    }
}

impl std::fmt::Display for TickOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Suppressed(reason) => write!(f, "suppressed ({reason})"),
            Self::Skipped(reason) => write!(f, "skipped ({reason})"),
            Self::Sent { message } => write!(f, "sent: {message}"),
        }
    }
}

pub struct ProactiveScheduler {
    shared: Shared,
    oracle: DecisionOracle,
    tool_loop: ToolLoop,
    window: QuietWindow,
    interval: TickInterval,
    cooldown: Option<chrono::Duration>,
    history_window: usize,
    checkins: CheckinPlan,
    user: crate::config::UserConfig,
}

impl ProactiveScheduler {
    pub fn new(
        config: &Config,
        shared: Shared,
        oracle: DecisionOracle,
        checkins: CheckinPlan,
    ) -> Self {
        let scheduler = &config.scheduler;
        let (min, max) = scheduler.tick_bounds(config.test_mode);
        let registry = Arc::new(ToolRegistry::proactive(
            Arc::clone(&shared.gateway),
            Arc::clone(&shared.clock),
        ));
        let cooldown = (!config.test_mode && scheduler.cooldown_minutes > 0)
            .then(|| chrono::Duration::minutes(scheduler.cooldown_minutes));
        Self {
            tool_loop: ToolLoop::new(registry, scheduler.max_tool_iterations),
            window: QuietWindow::new(scheduler.quiet_start, scheduler.quiet_end),
            interval: TickInterval::new(min, max),
            cooldown,
            history_window: scheduler.history_window,
            user: config.user.clone(),
            shared,
            oracle,
            checkins,
        }
    }

    pub fn interval(&self) -> TickInterval {
        self.interval
    }

    pub fn checkins(&self) -> &CheckinPlan {
        &self.checkins
    }

    /// Guards that need nothing but the clock, the signal, and state.
    async fn guard(&self, now: DateTime<Local>) -> Option<SuppressReason> {
        if self.window.is_quiet(now) {
            return Some(SuppressReason::QuietHours);
        }
        if self.shared.coordinator.is_user_interacting() {
            return Some(SuppressReason::UserInteracting);
        }

        let state = self.shared.session.load().await;
        if let Some(cooldown) = self.cooldown
            && state.within_cooldown(now, cooldown)
        {
            return Some(SuppressReason::Cooldown);
        }
        if state.is_working(now) {
            return Some(SuppressReason::WorkingUntil);
        }
        if state.working_until.is_some() {
            self.shared
                .session
                .update(|s| s.clear_expired_deadline(now))
                .await;
            tracing::info!("Working deadline passed, cleared");
        }
        None
    }

    /// Evaluate one tick at `now`. Never fails: every problem becomes an
    /// outcome.
    pub async fn run_tick(&self, now: DateTime<Local>) -> TickOutcome {
        let outcome = self.evaluate(now).await;
        match &outcome {
            TickOutcome::Suppressed(reason) => {
                tracing::info!(reason = %reason, "Proactive tick suppressed");
            }
            TickOutcome::Skipped(reason) => {
                tracing::info!(reason = %reason, "Proactive tick skipped");
            }
            TickOutcome::Sent { message } => {
                tracing::info!(chars = message.len(), "Proactive message sent");
            }
        }
        outcome
    }

    async fn evaluate(&self, now: DateTime<Local>) -> TickOutcome {
        if let Some(reason) = self.guard(now).await {
            return TickOutcome::Suppressed(reason);
        }

        let state = self.shared.session.load().await;
        self.shared.history.roll_over(now);
        let recent = self.shared.history.recent(self.history_window);
        let manifest = self.shared.gateway.list_readable().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Could not list readable files");
            Vec::new()
        });

        let system = format!(
            "{}\n\n{}",
            self.shared.persona.system_context().await,
            context::decision_instructions(&self.user)
        );
        let payload = context::build_context(now, &state, &recent, &manifest, &self.user);

        let answer = match self
            .tool_loop
            .run(&self.oracle, &system, vec![ProviderMessage::user(payload)])
            .await
            .and_then(|result| result.into_answer())
        {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(provider = self.oracle.provider_name(), error = %e, "Proactive oracle call failed");
                return TickOutcome::Skipped(SkipReason::OracleFailure);
            }
        };

        let decision = match parse_decision(&answer) {
            Ok(decision) => decision,
            Err(e) => {
                let preview: String = answer.chars().take(100).collect();
                tracing::warn!(error = %e, output = %preview, "Malformed proactive decision");
                return TickOutcome::Skipped(SkipReason::MalformedDecision);
            }
        };

        let Some(message) = decision.outgoing() else {
            tracing::info!(
                rationale = decision.rationale.as_deref().unwrap_or("none"),
                "Oracle chose silence"
            );
            return TickOutcome::Skipped(if decision.should_message {
                SkipReason::EmptyMessage
            } else {
                SkipReason::Declined
            });
        };

        tracing::info!(
            rationale = decision.rationale.as_deref().unwrap_or("none"),
            "Oracle chose to message"
        );
        self.dispatch(message).await
    }

    /// Send a proactive message under the dispatch slot and record it.
    async fn dispatch(&self, message: &str) -> TickOutcome {
        let Some(recipient) = self.shared.outbound.default_recipient().map(str::to_string) else {
            tracing::warn!(
                channel = self.shared.outbound.channel_name(),
                "No recipient for proactive messages"
            );
            return TickOutcome::Skipped(SkipReason::DispatchFailed);
        };

        let Some(_slot) = self.shared.coordinator.proactive_slot().await else {
            return TickOutcome::Suppressed(SuppressReason::UserInteracting);
        };

        if let Err(e) = self
            .shared
            .outbound
            .send_lines(&recipient, &[message.to_string()])
            .await
        {
            tracing::warn!(error = %e, "Proactive dispatch failed");
            return TickOutcome::Skipped(SkipReason::DispatchFailed);
        }

        let sent_at = self.shared.clock.now();
        self.shared.history.append(Role::Agent, message, sent_at);
        self.shared
            .session
            .update(|state| state.record_proactive_message(sent_at))
            .await;

        TickOutcome::Sent {
            message: message.to_string(),
        }
    }

    /// Fixed check-in: same interaction signal and dispatch slot as a tick,
    /// no oracle.
    pub async fn send_checkin(&self, message: &str) -> TickOutcome {
        if self.shared.coordinator.is_user_interacting() {
            tracing::info!("Check-in suppressed: user is interacting");
            return TickOutcome::Suppressed(SuppressReason::UserInteracting);
        }
        let outcome = self.dispatch(message).await;
        tracing::info!(outcome = %outcome, "Check-in evaluated");
        outcome
    }

    /// Tick forever at randomized intervals.
    pub async fn run(self: Arc<Self>) -> anyhow::Result<()> {
        let (min, max) = self.interval.bounds();
        tracing::info!(
            min_secs = min.as_secs(),
            max_secs = max.as_secs(),
            quiet = ?self.window,
            "Proactive scheduler started"
        );
        loop {
            let delay = self.interval.sample();
            tracing::debug!(secs = delay.as_secs(), "Next proactive tick scheduled");
            tokio::time::sleep(delay).await;
            self.run_tick(self.shared.clock.now()).await;
        }
    }

    /// Sleep until each check-in is due and send it.
    pub async fn run_checkins(self: Arc<Self>) -> anyhow::Result<()> {
        loop {
            let now = self.shared.clock.now();
            let Some((due, checkin)) = self.checkins.next_after(now) else {
                anyhow::bail!("no upcoming check-ins");
            };
            let wait = (due - now).to_std().unwrap_or_default();
            tracing::debug!(schedule = checkin.expression(), due = %due, "Next check-in");
            tokio::time::sleep(wait).await;
            self.send_checkin(checkin.message()).await;
        }
    }
}
