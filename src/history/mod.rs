//! Day-scoped conversation log shared by the reactive and proactive paths.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::sync::Mutex;
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Agent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Local>,
}

impl HistoryEntry {
    /// Content prefixed with its time. User turns carry the full date so the
    /// oracle can reason about "yesterday" without a separate lookup.
    pub fn annotated(&self) -> String {
        match self.role {
            Role::User => format!(
                "[{}] {}",
                self.timestamp.format("%H:%M %A %Y-%m-%d"),
                self.content
            ),
            Role::Agent => format!("[{}] {}", self.timestamp.format("%H:%M"), self.content),
        }
    }
}

/// In-memory, append-only within one local calendar day.
///
/// Entries are kept ordered by their timestamp, so an append from a path that
/// finished late still lands where it happened. The first append (or explicit
/// [`HistoryBuffer::roll_over`]) on a new local date clears the previous day.
#[derive(Debug, Default)]
pub struct HistoryBuffer {
    entries: Mutex<Vec<HistoryEntry>>,
}

impl HistoryBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<HistoryEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn roll_over_locked(entries: &mut Vec<HistoryEntry>, now: DateTime<Local>) -> bool {
        let stale = entries
            .last()
            .is_some_and(|last| last.timestamp.date_naive() < now.date_naive());
        if stale {
            let dropped = entries.len();
            entries.clear();
            tracing::info!(dropped, date = %now.date_naive(), "Conversation history reset for new day");
        }
        stale
    }

    /// Clear yesterday's entries if the day has turned. Returns whether it did.
    pub fn roll_over(&self, now: DateTime<Local>) -> bool {
        Self::roll_over_locked(&mut self.lock(), now)
    }

    pub fn append(&self, role: Role, content: impl Into<String>, at: DateTime<Local>) {
        let mut entries = self.lock();
        Self::roll_over_locked(&mut entries, at);
        let index = entries.partition_point(|e| e.timestamp <= at);
        entries.insert(
            index,
            HistoryEntry {
                role,
                content: content.into(),
                timestamp: at,
            },
        );
    }

    pub fn snapshot(&self) -> Vec<HistoryEntry> {
        self.lock().clone()
    }

    /// The last `n` entries, oldest first.
    pub fn recent(&self, n: usize) -> Vec<HistoryEntry> {
        let entries = self.lock();
        let start = entries.len().saturating_sub(n);
        entries[start..].to_vec()
    }

    /// Explicit wipe (the `/clear` command). Returns how many entries went.
    pub fn clear(&self) -> usize {
        let mut entries = self.lock();
        let n = entries.len();
        entries.clear();
        n
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Plain transcript, one annotated entry per line, for prompt context.
pub fn render_transcript(entries: &[HistoryEntry]) -> String {
    entries
        .iter()
        .map(|e| format!("{}: {}", e.role, e.annotated()))
        .collect::<Vec<_>>()
        .join("\n")
}
