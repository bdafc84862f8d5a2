use crate::config::{OracleConfig, ProviderKind};

/// Which control path is asking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum OracleMode {
    Reactive,
    Proactive,
}

const ANTHROPIC_DEFAULT_MODEL: &str = "claude-3-5-haiku-20241022";
const DEEPSEEK_DEFAULT_MODEL: &str = "deepseek-chat";

const DECISION_FORMAT_HINT: &str =
    "The `message` field must be a single string using \\n for line breaks, not an array.";

const DEEPSEEK_REACTIVE_STYLE: &str = "\
Keep it short: one thought per line, a few words each.
Read the history before answering and never repeat yourself.
When the user sets a task or gives feedback, call write_knowledge. Saying \
\"updated\" without the call loses the data. Prefer mode=\"append\" for new entries.
When the user names a duration, do not check in before it is over.";

const DEEPSEEK_PROACTIVE_STYLE: &str = "\
Never argue with the user's chosen priorities; help finish them.
Intensity is about tone, not about how often you interrupt.
Write from their context; do not paste file contents.";

/// Per-provider model choice and the extra instructions appended to the
/// system context for that provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    pub kind: ProviderKind,
    pub model: String,
    pub auxiliary: String,
}

impl ProviderProfile {
    pub fn resolve(kind: ProviderKind, mode: OracleMode, config: &OracleConfig) -> Self {
        let (configured, default_model) = match kind {
            ProviderKind::Anthropic => (config.anthropic_model.as_deref(), ANTHROPIC_DEFAULT_MODEL),
            ProviderKind::Deepseek => (config.deepseek_model.as_deref(), DEEPSEEK_DEFAULT_MODEL),
        };
        let model = configured
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(default_model)
            .to_string();

        let auxiliary = match (kind, mode) {
            (ProviderKind::Anthropic, OracleMode::Proactive) => DECISION_FORMAT_HINT,
            (ProviderKind::Anthropic, OracleMode::Reactive) => "",
            (ProviderKind::Deepseek, OracleMode::Reactive) => DEEPSEEK_REACTIVE_STYLE,
            (ProviderKind::Deepseek, OracleMode::Proactive) => DEEPSEEK_PROACTIVE_STYLE,
        }
        .to_string();

        Self {
            kind,
            model,
            auxiliary,
        }
    }

    /// The system context with this provider's auxiliary instructions appended.
    pub fn apply(&self, system: &str) -> String {
        if self.auxiliary.is_empty() {
            system.to_string()
        } else if system.is_empty() {
            self.auxiliary.clone()
        } else {
            format!("{system}\n\n{}", self.auxiliary)
        }
    }
}
