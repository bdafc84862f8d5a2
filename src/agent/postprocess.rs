//! Shaping of oracle output before it reaches the user.

use regex::Regex;
use std::sync::LazyLock;

static LEADING_TIME_ANNOTATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*\[\d{1,2}:\d{2}(?: [^\]\n]*)?\][ \t]*")
        .expect("time annotation regex must compile")
});

static ACK_LANGUAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(updated|noted|saved|recorded|logged)\b")
        .expect("acknowledgment regex must compile")
});

/// Remove `[HH:MM]`-style annotations the oracle echoes back from history.
/// Only annotations at the start of a line are touched.
pub fn strip_time_annotations(text: &str) -> String {
    LEADING_TIME_ANNOTATION.replace_all(text, "").into_owned()
}

/// Non-empty trimmed lines.
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Break a line after `.`, `!` or `?` when whitespace follows.
pub fn split_sentences(line: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut prev_terminal = false;
    for (i, c) in line.char_indices() {
        if c.is_whitespace() && prev_terminal {
            parts.push(&line[start..i]);
            start = i;
        }
        prev_terminal = matches!(c, '.' | '!' | '?');
    }
    parts.push(&line[start..]);
    parts
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect()
}

/// Texting style: one sentence per message, no trailing `.` or `,`.
/// `?` and `!` stay.
pub fn casual_messages(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .flat_map(|line| split_sentences(line))
        .map(|sentence| sentence.trim_end_matches(['.', ',']).trim_end())
        .filter(|sentence| !sentence.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Cap the number of outbound messages by folding overflow into the last one.
pub fn cap_lines(mut lines: Vec<String>, max: usize) -> Vec<String> {
    let max = max.max(1);
    if lines.len() <= max {
        return lines;
    }
    let overflow = lines.split_off(max - 1);
    lines.push(overflow.join("\n"));
    lines
}

/// Whether the text claims something was saved.
pub fn mentions_acknowledgment(text: &str) -> bool {
    ACK_LANGUAGE.is_match(text)
}

/// Drop lines carrying acknowledgment language, keeping the rest.
pub fn strip_ack_lines(text: &str) -> String {
    text.lines()
        .filter(|line| !ACK_LANGUAGE.is_match(line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Full outbound shaping: strip annotations, split into lines and
/// sentences, drop trailing `.`/`,`, cap.
pub fn outbound_lines(text: &str, max_lines: usize) -> Vec<String> {
    let lines = split_lines(&strip_time_annotations(text));
    cap_lines(casual_messages(&lines), max_lines)
}
