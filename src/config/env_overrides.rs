use super::Config;
use std::env;

fn var(primary: &str, fallback: &str) -> Option<String> {
    env::var(primary)
        .or_else(|_| env::var(fallback))
        .ok()
        .filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Layer `SPARK_*` variables (falling back to the bare legacy names) over
    /// the file config. Unparseable numbers are ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Some(token) = var("SPARK_TELEGRAM_BOT_TOKEN", "TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = Some(token);
        }

        if let Some(user_id) = var("SPARK_TELEGRAM_USER_ID", "USER_TELEGRAM_ID") {
            self.telegram.allowed_user_id = Some(user_id);
        }

        if let Some(key) = var("SPARK_ANTHROPIC_API_KEY", "ANTHROPIC_API_KEY") {
            self.oracle.anthropic_api_key = Some(key);
        }

        if let Some(key) = var("SPARK_DEEPSEEK_API_KEY", "DEEPSEEK_API_KEY") {
            self.oracle.deepseek_api_key = Some(key);
        }

        if let Some(root) = var("SPARK_KNOWLEDGE_ROOT", "THINK_OS_PATH") {
            self.knowledge.root = root;
        }

        if let Some(raw) = var("SPARK_TICK_MIN_MINUTES", "TICK_MIN_MINUTES")
            && let Ok(minutes) = raw.trim().parse::<f64>()
        {
            self.scheduler.tick_min_minutes = minutes;
        }

        if let Some(raw) = var("SPARK_TICK_MAX_MINUTES", "TICK_MAX_MINUTES")
            && let Ok(minutes) = raw.trim().parse::<f64>()
        {
            self.scheduler.tick_max_minutes = minutes;
        }

        if let Some(raw) = var("SPARK_QUIET_START", "QUIET_START")
            && let Ok(hour) = raw.trim().parse::<u32>()
        {
            self.scheduler.quiet_start = hour;
        }

        if let Some(raw) = var("SPARK_QUIET_END", "QUIET_END")
            && let Ok(hour) = raw.trim().parse::<u32>()
        {
            self.scheduler.quiet_end = hour;
        }

        if let Some(raw) = var("SPARK_DEBOUNCE_SECS", "DEBOUNCE_SECONDS")
            && let Ok(secs) = raw.trim().parse::<f64>()
        {
            self.conversation.debounce_secs = secs;
        }

        if let Some(raw) = var("SPARK_REACTIVE_PROVIDER", "COACH_PROVIDER")
            && let Ok(kind) = raw.trim().parse()
        {
            self.oracle.reactive = kind;
        }

        if let Some(raw) = var("SPARK_PROACTIVE_PROVIDER", "ORCHESTRATOR_PROVIDER")
            && let Ok(kind) = raw.trim().parse()
        {
            self.oracle.proactive = kind;
        }

        if let Some(name) = var("SPARK_USER_NAME", "USER_NAME") {
            self.user.name = name;
        }

        if let Some(pronouns) = var("SPARK_USER_PRONOUNS", "USER_PRONOUNS") {
            self.user.pronouns = pronouns;
        }

        if let Some(raw) = var("SPARK_GUILT_LEVEL", "GUILT_LEVEL")
            && let Ok(level) = raw.trim().parse()
        {
            self.user.guilt_level = level;
        }

        if let Ok(style) = env::var("SPARK_STYLE")
            && !style.trim().is_empty()
        {
            self.user.style = Some(style);
        }

        if let Some(raw) = var("SPARK_TEST_MODE", "TEST_MODE") {
            self.test_mode = matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
    }
}
