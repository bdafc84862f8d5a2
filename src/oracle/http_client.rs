use reqwest::Client;
use std::time::Duration;

/// Shared client settings for provider calls. The per-request deadline is
/// enforced one level up by the oracle adapter; this is the transport cap.
pub fn build_provider_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!("Falling back to default HTTP client: {e}");
            Client::new()
        })
}
