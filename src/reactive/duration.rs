use regex::Regex;
use std::sync::LazyLock;

static HOURS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(?:hours?|hrs?|h)\b").expect("hours regex must compile")
});

static MINUTES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s*(?:minutes?|mins?|m)\b").expect("minutes regex must compile")
});

/// Longest work block a message can set: one day.
pub const MAX_WORKING_MINUTES: i64 = 24 * 60;

/// Work duration mentioned in a message, in whole minutes, capped at
/// [`MAX_WORKING_MINUTES`]. "1 hour 30 min" sums both parts.
pub fn parse_duration_minutes(text: &str) -> Option<i64> {
    let hours = HOURS
        .captures(text)
        .and_then(|c| c[1].parse::<f64>().ok());
    let minutes = MINUTES
        .captures(text)
        .and_then(|c| c[1].parse::<f64>().ok());

    let total = match (hours, minutes) {
        (None, None) => return None,
        (h, m) => h.unwrap_or(0.0) * 60.0 + m.unwrap_or(0.0),
    };
    if !total.is_finite() {
        return Some(MAX_WORKING_MINUTES);
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    let capped = total.round().clamp(0.0, MAX_WORKING_MINUTES as f64) as i64;
    Some(capped)
}
