use super::types::{ProviderMessage, ProviderResponse};
use crate::tools::ToolSpec;
use std::future::Future;
use std::pin::Pin;

/// Everything a provider needs for one round trip.
#[derive(Debug, Clone, Copy)]
pub struct ChatRequest<'a> {
    pub system: &'a str,
    pub messages: &'a [ProviderMessage],
    pub tools: &'a [ToolSpec],
    pub model: &'a str,
    pub temperature: f64,
}

pub trait Provider: Send + Sync {
    /// Provider identifier (e.g. "anthropic", "deepseek").
    fn name(&self) -> &str;

    fn chat<'a>(
        &'a self,
        request: ChatRequest<'a>,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<ProviderResponse>> + Send + 'a>>;
}
