use super::anthropic::AnthropicProvider;
use super::compatible::CompatibleProvider;
use super::traits::Provider;
use crate::config::{OracleConfig, ProviderKind};
use std::sync::Arc;

const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com";

/// Build the HTTP provider for `kind` from oracle configuration. Missing
/// keys are reported at call time, not here, so `spark state` and friends
/// work without credentials.
pub fn create_provider(kind: ProviderKind, config: &OracleConfig) -> Arc<dyn Provider> {
    match kind {
        ProviderKind::Anthropic => Arc::new(AnthropicProvider::new(
            config.anthropic_api_key.as_deref(),
            config.anthropic_base_url.as_deref(),
            config.timeout(),
        )),
        ProviderKind::Deepseek => Arc::new(CompatibleProvider::new(
            "deepseek",
            config
                .deepseek_base_url
                .as_deref()
                .unwrap_or(DEEPSEEK_BASE_URL),
            config.deepseek_api_key.as_deref(),
            config.timeout(),
        )),
    }
}
