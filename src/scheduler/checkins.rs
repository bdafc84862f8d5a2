use crate::config::CheckinConfig;
use crate::error::ConfigError;
use chrono::{DateTime, Local};
use cron::Schedule;
use std::str::FromStr;

/// One fixed message sent on a cron schedule.
#[derive(Debug, Clone)]
pub struct Checkin {
    expression: String,
    schedule: Schedule,
    message: String,
}

impl Checkin {
    pub fn parse(expression: &str, message: &str) -> Result<Self, ConfigError> {
        let normalized = normalize_expression(expression)?;
        let schedule = Schedule::from_str(&normalized).map_err(|e| {
            ConfigError::Validation(format!("invalid check-in schedule '{expression}': {e}"))
        })?;
        Ok(Self {
            expression: expression.trim().to_string(),
            schedule,
            message: message.to_string(),
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn next_after(&self, from: DateTime<Local>) -> Option<DateTime<Local>> {
        self.schedule.after(&from).next()
    }
}

/// Accept standard 5-field crontab syntax as well as the crate's
/// seconds-first 6/7-field form.
fn normalize_expression(expression: &str) -> Result<String, ConfigError> {
    let expression = expression.trim();
    match expression.split_whitespace().count() {
        5 => Ok(format!("0 {expression}")),
        6 | 7 => Ok(expression.to_string()),
        n => Err(ConfigError::Validation(format!(
            "invalid check-in schedule '{expression}': expected 5, 6, or 7 fields, got {n}"
        ))),
    }
}

/// All configured check-ins.
#[derive(Debug, Clone, Default)]
pub struct CheckinPlan {
    checkins: Vec<Checkin>,
}

impl CheckinPlan {
    pub fn from_config(configs: &[CheckinConfig]) -> Result<Self, ConfigError> {
        let checkins = configs
            .iter()
            .map(|c| Checkin::parse(&c.schedule, &c.message))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { checkins })
    }

    pub fn is_empty(&self) -> bool {
        self.checkins.is_empty()
    }

    pub fn checkins(&self) -> &[Checkin] {
        &self.checkins
    }

    /// The soonest check-in strictly after `from`.
    pub fn next_after(&self, from: DateTime<Local>) -> Option<(DateTime<Local>, &Checkin)> {
        self.checkins
            .iter()
            .filter_map(|c| c.next_after(from).map(|at| (at, c)))
            .min_by_key(|(at, _)| *at)
    }
}
