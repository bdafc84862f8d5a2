use crate::config::UserConfig;
use crate::history::{HistoryEntry, Role};
use crate::session::SessionState;
use chrono::{DateTime, Local};

const DEFAULT_STYLE: &str = "Text like a friend who roasts. Direct, no filter.";

/// Decision contract appended to the persona context on proactive ticks.
pub fn decision_instructions(user: &UserConfig) -> String {
    let style = user
        .style
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_STYLE);
    format!(
        "## Proactive check\n\
         Decide whether to message the user right now. Read the files you need with \
         read_knowledge first; trust the recent conversation over stale files. Never repeat \
         something you already said today.\n\
         Style: {style}\n\n\
         ## Output format\n\
         Reply with a JSON object only:\n\
         ```json\n\
         {{\"should_message\": true, \"rationale\": \"why\", \"message\": \"text\"}}\n\
         ```"
    )
}

/// The user-turn payload handed to the oracle on a proactive tick.
pub fn build_context(
    now: DateTime<Local>,
    state: &SessionState,
    recent: &[HistoryEntry],
    manifest: &[String],
    user: &UserConfig,
) -> String {
    let mut sections = Vec::new();

    if recent.is_empty() {
        sections.push("Recent conversation: none yet today".to_string());
    } else {
        let lines: Vec<String> = recent
            .iter()
            .map(|entry| {
                let speaker = match entry.role {
                    Role::Agent => "Spark",
                    Role::User => user.name.as_str(),
                };
                format!("- {speaker}: {}", entry.annotated())
            })
            .collect();
        sections.push(format!(
            "Recent conversation (today), do not repeat yourself:\n{}",
            lines.join("\n")
        ));
    }

    let yesterday = now - chrono::Duration::days(1);
    sections.push(format!(
        "Current time: {}\nToday's date: {}\nYesterday's date: {}",
        now.format("%H:%M %A"),
        now.format("%Y-%m-%d"),
        yesterday.format("%Y-%m-%d")
    ));

    sections.push(match state.minutes_since_interaction(now) {
        Some(minutes) => format!("Last user reply: {minutes} min ago"),
        None => "Last user reply: never".to_string(),
    });
    sections.push(format!(
        "Unanswered proactive messages: {}",
        state.unanswered_count
    ));

    let mut extras = Vec::new();
    if let Some(stuck) = &state.stuck_on {
        extras.push(format!("Previously stuck on: {stuck}"));
    }
    if let Some(focus) = &state.current_focus {
        extras.push(format!("Today's focus: {focus}"));
    }
    if let Some(summary) = &state.last_checkin_summary {
        extras.push(format!("Last check-in: {summary}"));
    }
    if let Some(sent) = state.last_proactive_message {
        extras.push(format!("Last proactive message at: {}", sent.format("%H:%M")));
    }
    if let Some(until) = state.working_until {
        extras.push(format!("Working until: {}", until.format("%H:%M")));
    }
    if !extras.is_empty() {
        sections.push(extras.join("\n"));
    }

    if manifest.is_empty() {
        sections.push("Readable files: none".to_string());
    } else {
        sections.push(format!("Readable files:\n{}", manifest.join("\n")));
    }

    format!(
        "Context:\n\n{}\n\nRead what you need, then decide whether to send a message.",
        sections.join("\n\n")
    )
}
