use chrono::{DateTime, Duration, Local};
use serde::{Deserialize, Serialize};

/// Durable accountability state, one per deployment.
///
/// `unanswered_count` only goes back to zero through
/// [`SessionState::record_interaction`]; between resets it only grows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionState {
    #[serde(with = "timestamp")]
    pub last_interaction: Option<DateTime<Local>>,
    pub unanswered_count: u32,
    pub stuck_on: Option<String>,
    pub current_focus: Option<String>,
    pub last_checkin_summary: Option<String>,
    #[serde(with = "timestamp", alias = "last_spark_message")]
    pub last_proactive_message: Option<DateTime<Local>>,
    #[serde(with = "timestamp")]
    pub working_until: Option<DateTime<Local>>,
}

impl SessionState {
    /// A confirmed inbound user message.
    pub fn record_interaction(&mut self, now: DateTime<Local>) {
        self.unanswered_count = 0;
        self.last_interaction = Some(now);
    }

    /// A dispatched proactive message.
    pub fn record_proactive_message(&mut self, now: DateTime<Local>) {
        self.unanswered_count = self.unanswered_count.saturating_add(1);
        self.last_proactive_message = Some(now);
    }

    pub fn minutes_since_interaction(&self, now: DateTime<Local>) -> Option<i64> {
        self.last_interaction
            .map(|at| now.signed_duration_since(at).num_minutes())
    }

    pub fn within_cooldown(&self, now: DateTime<Local>, cooldown: Duration) -> bool {
        self.last_proactive_message
            .is_some_and(|at| now.signed_duration_since(at) < cooldown)
    }

    pub fn is_working(&self, now: DateTime<Local>) -> bool {
        self.working_until.is_some_and(|until| now < until)
    }

    /// Drop a working deadline that has passed. Returns whether it changed.
    pub fn clear_expired_deadline(&mut self, now: DateTime<Local>) -> bool {
        if self.working_until.is_some_and(|until| now >= until) {
            self.working_until = None;
            return true;
        }
        false
    }
}

/// RFC 3339 on write; also accepts naive ISO-8601 (read as local time).
mod timestamp {
    use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Local>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(at) => serializer.serialize_some(&at.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Local>>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
            return Ok(None);
        };
        parse(raw.trim())
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("unrecognized timestamp: {raw}")))
    }

    fn parse(raw: &str) -> Option<DateTime<Local>> {
        if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
            return Some(at.with_timezone(&Local));
        }
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .and_then(|naive| Local.from_local_datetime(&naive).earliest())
    }
}
