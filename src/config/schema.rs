use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use strum::{AsRefStr, Display, EnumString};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to config.toml - computed from home, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Short tick intervals, no cooldown. For poking at a live deployment.
    #[serde(default)]
    pub test_mode: bool,

    #[serde(default)]
    pub user: UserConfig,

    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub conversation: ConversationConfig,

    #[serde(default)]
    pub oracle: OracleConfig,

    #[serde(default)]
    pub telegram: TelegramConfig,

    #[serde(default)]
    pub reliability: ReliabilityConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: PathBuf::new(),
            test_mode: false,
            user: UserConfig::default(),
            knowledge: KnowledgeConfig::default(),
            scheduler: SchedulerConfig::default(),
            conversation: ConversationConfig::default(),
            oracle: OracleConfig::default(),
            telegram: TelegramConfig::default(),
            reliability: ReliabilityConfig::default(),
        }
    }
}

/// Longest accepted tick interval (one week).
const MAX_TICK_MINUTES: f64 = 7.0 * 24.0 * 60.0;
const MAX_DEBOUNCE_SECS: f64 = 300.0;

/// Non-panicking seconds-to-`Duration`; out-of-range input yields `fallback`.
fn secs_or(secs: f64, fallback: Duration) -> Duration {
    Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(fallback)
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.scheduler;
        let in_range = |m: f64| m.is_finite() && m > 0.0 && m <= MAX_TICK_MINUTES;
        if !(in_range(s.tick_min_minutes) && in_range(s.tick_max_minutes)) {
            return Err(ConfigError::Validation(format!(
                "scheduler.tick_min_minutes and tick_max_minutes must be positive and at most {MAX_TICK_MINUTES}"
            )));
        }
        if s.tick_min_minutes > s.tick_max_minutes {
            return Err(ConfigError::Validation(format!(
                "scheduler.tick_min_minutes ({}) exceeds tick_max_minutes ({})",
                s.tick_min_minutes, s.tick_max_minutes
            )));
        }
        if s.quiet_start > 23 || s.quiet_end > 23 {
            return Err(ConfigError::Validation(format!(
                "quiet hours must be 0-23, got {}..{}",
                s.quiet_start, s.quiet_end
            )));
        }
        let debounce = self.conversation.debounce_secs;
        if !(debounce.is_finite() && debounce > 0.0 && debounce <= MAX_DEBOUNCE_SECS) {
            return Err(ConfigError::Validation(format!(
                "conversation.debounce_secs must be positive and at most {MAX_DEBOUNCE_SECS}, got {debounce}"
            )));
        }
        if self.conversation.max_outbound_lines == 0 {
            return Err(ConfigError::Validation(
                "conversation.max_outbound_lines must be at least 1".into(),
            ));
        }
        if self.knowledge.root.trim().is_empty() {
            return Err(ConfigError::Validation(
                "knowledge.root is not set (THINK_OS_PATH)".into(),
            ));
        }
        Ok(())
    }

    /// Knowledge root with `~` expanded.
    pub fn knowledge_root(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(self.knowledge.root.trim()).into_owned())
    }
}

// ─── User ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum GuiltLevel {
    Chill,
    #[default]
    Medium,
    Savage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default = "default_user_name")]
    pub name: String,
    #[serde(default = "default_pronouns")]
    pub pronouns: String,
    #[serde(default)]
    pub guilt_level: GuiltLevel,
    /// Extra free-form tone guidance appended to the persona.
    #[serde(default)]
    pub style: Option<String>,
}

fn default_user_name() -> String {
    "friend".into()
}

fn default_pronouns() -> String {
    "they/them".into()
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            name: default_user_name(),
            pronouns: default_pronouns(),
            guilt_level: GuiltLevel::default(),
            style: None,
        }
    }
}

// ─── Knowledge store ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    #[serde(default)]
    pub root: String,
    #[serde(default = "default_state_path")]
    pub state_path: String,
    #[serde(default = "default_readable")]
    pub readable: Vec<String>,
    #[serde(default = "default_writable")]
    pub writable: Vec<String>,
    #[serde(default = "default_blocked")]
    pub blocked: Vec<String>,
}

fn default_state_path() -> String {
    "memory/spark/state.json".into()
}

fn default_readable() -> Vec<String> {
    [
        "now.md",
        "memory/*.md",
        "memory/spark/*.md",
        "memory/spark/*.json",
        "memory/timeline/perspective.md",
        "memory/timeline/daily/*.md",
        "memory/timeline/todo/*.md",
        "memory/people/*.md",
        "tinker",
        "tinker/*",
        "tinker/**/*.md",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_writable() -> Vec<String> {
    [
        "memory/timeline/daily/*.md",
        "memory/timeline/todo/*.md",
        "memory/spark/*.md",
        "memory/spark/*.json",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_blocked() -> Vec<String> {
    ["**/*.secret.md", "private/**", ".git/**"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            root: String::new(),
            state_path: default_state_path(),
            readable: default_readable(),
            writable: default_writable(),
            blocked: default_blocked(),
        }
    }
}

// ─── Proactive scheduler ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckinConfig {
    /// Five-field crontab expression in local time.
    pub schedule: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_tick_min")]
    pub tick_min_minutes: f64,
    #[serde(default = "default_tick_max")]
    pub tick_max_minutes: f64,
    #[serde(default = "default_quiet_start")]
    pub quiet_start: u32,
    #[serde(default = "default_quiet_end")]
    pub quiet_end: u32,
    /// Minimum gap between two proactive messages.
    #[serde(default = "default_cooldown_minutes")]
    pub cooldown_minutes: i64,
    #[serde(default = "default_max_tool_iterations")]
    pub max_tool_iterations: u32,
    /// Number of trailing history entries included in the decision context.
    #[serde(default = "default_history_window")]
    pub history_window: usize,
    #[serde(default = "default_checkins")]
    pub checkins: Vec<CheckinConfig>,
}

fn default_true() -> bool {
    true
}

fn default_tick_min() -> f64 {
    1.0
}

fn default_tick_max() -> f64 {
    20.0
}

fn default_quiet_start() -> u32 {
    23
}

fn default_quiet_end() -> u32 {
    8
}

fn default_cooldown_minutes() -> i64 {
    5
}

fn default_max_tool_iterations() -> u32 {
    10
}

fn default_history_window() -> usize {
    20
}

fn default_checkins() -> Vec<CheckinConfig> {
    vec![
        CheckinConfig {
            schedule: "0 8 * * *".into(),
            message: "gm, what's on the agenda today?".into(),
        },
        CheckinConfig {
            schedule: "0 21 * * *".into(),
            message: "how'd today go?".into(),
        },
    ]
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tick_min_minutes: default_tick_min(),
            tick_max_minutes: default_tick_max(),
            quiet_start: default_quiet_start(),
            quiet_end: default_quiet_end(),
            cooldown_minutes: default_cooldown_minutes(),
            max_tool_iterations: default_max_tool_iterations(),
            history_window: default_history_window(),
            checkins: default_checkins(),
        }
    }
}

impl SchedulerConfig {
    /// Bounds of the random tick delay. Test mode pins them to 10–20 seconds.
    pub fn tick_bounds(&self, test_mode: bool) -> (Duration, Duration) {
        if test_mode {
            return (Duration::from_secs(10), Duration::from_secs(20));
        }
        (
            secs_or(
                self.tick_min_minutes * 60.0,
                Duration::from_secs_f64(default_tick_min() * 60.0),
            ),
            secs_or(
                self.tick_max_minutes * 60.0,
                Duration::from_secs_f64(default_tick_max() * 60.0),
            ),
        )
    }
}

// ─── Reactive conversation ───────────────────────────────────────────────────

/// What to do when a reply claims a write ("noted", "updated") that never happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AckRemediation {
    #[default]
    Warn,
    Retry,
    Strip,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    #[serde(default = "default_debounce_secs")]
    pub debounce_secs: f64,
    #[serde(default = "default_max_tool_iterations")]
    pub max_tool_iterations: u32,
    #[serde(default = "default_max_outbound_lines")]
    pub max_outbound_lines: usize,
    #[serde(default = "default_min_line_delay_ms")]
    pub min_line_delay_ms: u64,
    #[serde(default = "default_max_line_delay_ms")]
    pub max_line_delay_ms: u64,
    #[serde(default)]
    pub ack_remediation: AckRemediation,
    #[serde(default = "default_fallback_reply")]
    pub fallback_reply: String,
    /// Shortest stated work duration that sets a working deadline.
    #[serde(default = "default_min_working_minutes")]
    pub min_working_minutes: i64,
}

fn default_debounce_secs() -> f64 {
    4.0
}

fn default_max_outbound_lines() -> usize {
    4
}

fn default_min_line_delay_ms() -> u64 {
    800
}

fn default_max_line_delay_ms() -> u64 {
    2000
}

fn default_fallback_reply() -> String {
    "hold on".into()
}

fn default_min_working_minutes() -> i64 {
    5
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            debounce_secs: default_debounce_secs(),
            max_tool_iterations: default_max_tool_iterations(),
            max_outbound_lines: default_max_outbound_lines(),
            min_line_delay_ms: default_min_line_delay_ms(),
            max_line_delay_ms: default_max_line_delay_ms(),
            ack_remediation: AckRemediation::default(),
            fallback_reply: default_fallback_reply(),
            min_working_minutes: default_min_working_minutes(),
        }
    }
}

impl ConversationConfig {
    pub fn debounce(&self) -> Duration {
        secs_or(
            self.debounce_secs,
            Duration::from_secs_f64(default_debounce_secs()),
        )
    }
}

// ─── Decision oracle ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Display, EnumString, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ProviderKind {
    Anthropic,
    Deepseek,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Provider driving the conversation path.
    #[serde(default = "default_anthropic")]
    pub reactive: ProviderKind,
    /// Provider driving the should-I-message decisions.
    #[serde(default = "default_anthropic")]
    pub proactive: ProviderKind,
    #[serde(default)]
    pub anthropic_api_key: Option<String>,
    #[serde(default)]
    pub deepseek_api_key: Option<String>,
    #[serde(default)]
    pub anthropic_base_url: Option<String>,
    #[serde(default)]
    pub deepseek_base_url: Option<String>,
    #[serde(default)]
    pub anthropic_model: Option<String>,
    #[serde(default)]
    pub deepseek_model: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

fn default_anthropic() -> ProviderKind {
    ProviderKind::Anthropic
}

fn default_timeout_secs() -> u64 {
    90
}

fn default_temperature() -> f64 {
    0.7
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            reactive: default_anthropic(),
            proactive: default_anthropic(),
            anthropic_api_key: None,
            deepseek_api_key: None,
            anthropic_base_url: None,
            deepseek_base_url: None,
            anthropic_model: None,
            deepseek_model: None,
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
        }
    }
}

impl OracleConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

// ─── Telegram ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: Option<String>,
    /// The single numeric Telegram user id allowed to talk to the bot.
    #[serde(default)]
    pub allowed_user_id: Option<String>,
}

impl TelegramConfig {
    pub fn is_configured(&self) -> bool {
        self.bot_token.as_deref().is_some_and(|t| !t.is_empty())
            && self.allowed_user_id.as_deref().is_some_and(|u| !u.is_empty())
    }
}

// ─── Reliability ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReliabilityConfig {
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_secs: u64,
    #[serde(default = "default_max_backoff")]
    pub max_backoff_secs: u64,
    /// 0 means restart forever.
    #[serde(default)]
    pub max_restarts: u32,
}

fn default_initial_backoff() -> u64 {
    2
}

fn default_max_backoff() -> u64 {
    60
}

impl Default for ReliabilityConfig {
    fn default() -> Self {
        Self {
            initial_backoff_secs: default_initial_backoff(),
            max_backoff_secs: default_max_backoff(),
            max_restarts: 0,
        }
    }
}
