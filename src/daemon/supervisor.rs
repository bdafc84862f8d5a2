use crate::config::ReliabilityConfig;
use std::future::Future;
use tokio::task::JoinHandle;
use tokio::time::Duration;

/// Restart policy for one long-running component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartPolicy {
    pub initial_backoff_secs: u64,
    pub max_backoff_secs: u64,
    /// 0 means restart forever.
    pub max_restarts: u32,
}

impl RestartPolicy {
    pub fn from_config(config: &ReliabilityConfig) -> Self {
        let initial = config.initial_backoff_secs.max(1);
        Self {
            initial_backoff_secs: initial,
            max_backoff_secs: config.max_backoff_secs.max(initial),
            max_restarts: config.max_restarts,
        }
    }
}

/// Aborts the wrapped task when dropped, so aborting a supervisor also stops
/// the component run it is waiting on.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Run `run_component` in its own task, restarting it with exponential
/// backoff whenever it returns or panics. A component is not expected to
/// return at all, so a clean exit counts toward the restart limit too.
pub fn spawn_component_supervisor<F, Fut>(
    name: &'static str,
    policy: RestartPolicy,
    mut run_component: F,
) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    tokio::spawn(async move {
        let initial = policy.initial_backoff_secs.max(1);
        let max_backoff = policy.max_backoff_secs.max(initial);
        let mut backoff = initial;
        let mut failures: u32 = 0;

        loop {
            tracing::info!(component = name, "Component starting");
            let mut run = AbortOnDrop(tokio::spawn(run_component()));
            match (&mut run.0).await {
                Ok(Ok(())) => {
                    tracing::warn!(component = name, "Component exited unexpectedly");
                    backoff = initial;
                }
                Ok(Err(e)) => {
                    tracing::error!(component = name, error = %e, "Component failed");
                }
                Err(e) => {
                    tracing::error!(component = name, error = %e, "Component panicked");
                }
            }
            failures = failures.saturating_add(1);

            if policy.max_restarts > 0 && failures > policy.max_restarts {
                tracing::error!(
                    component = name,
                    max_restarts = policy.max_restarts,
                    "Restart limit exceeded, circuit open"
                );
                break;
            }
            tokio::time::sleep(Duration::from_secs(backoff)).await;
            backoff = backoff.saturating_mul(2).min(max_backoff);
        }
    })
}
