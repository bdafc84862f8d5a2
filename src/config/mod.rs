mod env_overrides;
mod loader;
mod schema;
#[cfg(test)]
pub(crate) mod test_env;

pub use schema::{
    AckRemediation, CheckinConfig, Config, ConversationConfig, GuiltLevel, KnowledgeConfig,
    OracleConfig, ProviderKind, ReliabilityConfig, SchedulerConfig, TelegramConfig, UserConfig,
};
