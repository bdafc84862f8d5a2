pub mod adapter;
pub mod anthropic;
pub mod compatible;
pub mod factory;
pub mod http_client;
pub mod profile;
pub mod scrub;
pub mod traits;
pub mod types;

pub use adapter::{DecisionOracle, normalize_history};
pub use factory::create_provider;
pub use profile::{OracleMode, ProviderProfile};
pub use scrub::scrub_secret_patterns;
pub use traits::{ChatRequest, Provider};
pub use types::{
    ContentBlock, MessageRole, OracleTurn, ProviderMessage, ProviderResponse, StopReason, ToolCall,
};

use crate::config::Config;
use std::sync::Arc;

/// Oracle for one control path, wired from configuration.
pub fn oracle_for(config: &Config, mode: OracleMode) -> DecisionOracle {
    let kind = match mode {
        OracleMode::Reactive => config.oracle.reactive,
        OracleMode::Proactive => config.oracle.proactive,
    };
    let provider: Arc<dyn Provider> = create_provider(kind, &config.oracle);
    DecisionOracle::new(
        provider,
        ProviderProfile::resolve(kind, mode, &config.oracle),
        mode,
        config.oracle.temperature,
        config.oracle.timeout(),
    )
}
