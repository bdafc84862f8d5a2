//! Process wiring: builds the shared handles and runs every long-lived
//! component under a restart supervisor until Ctrl-C.

mod supervisor;

pub use supervisor::{RestartPolicy, spawn_component_supervisor};

use crate::channels::{Channel, ChannelKind, ChannelMessage, Outbound, Pacing, build_channel};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::coordinator::InteractionCoordinator;
use crate::history::HistoryBuffer;
use crate::knowledge::KnowledgeGateway;
use crate::oracle::{DecisionOracle, OracleMode, oracle_for};
use crate::persona::Persona;
use crate::reactive::{Intake, ReactiveHandler};
use crate::scheduler::{CheckinPlan, ProactiveScheduler};
use crate::session::SessionStore;
use crate::shared::Shared;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

const INBOUND_CAPACITY: usize = 64;

/// Build the shared handles over the configured knowledge root.
pub fn build_shared(
    config: &Config,
    channel: Arc<dyn Channel>,
    clock: Arc<dyn Clock>,
) -> Result<Shared> {
    let root = config.knowledge_root();
    let gateway = Arc::new(
        KnowledgeGateway::local(&root, &config.knowledge)
            .with_context(|| format!("Failed to open knowledge root {}", root.display()))?,
    );
    let session = Arc::new(SessionStore::new(
        gateway.storage(),
        config.knowledge.state_path.clone(),
    ));
    let persona = Arc::new(Persona::new(Arc::clone(&gateway), config.user.clone()));
    let outbound = Arc::new(Outbound::new(
        channel,
        Pacing::from_config(&config.conversation),
    ));
    Ok(Shared {
        clock,
        coordinator: InteractionCoordinator::new(),
        session,
        history: Arc::new(HistoryBuffer::new()),
        gateway,
        persona,
        outbound,
    })
}

/// Every component of a running agent, before any task is spawned.
pub struct Runtime {
    pub shared: Shared,
    pub intake: Arc<Intake>,
    pub reactive: Arc<ReactiveHandler>,
    pub scheduler: Arc<ProactiveScheduler>,
    inbound_tx: mpsc::Sender<ChannelMessage>,
    inbound_rx: Arc<Mutex<mpsc::Receiver<ChannelMessage>>>,
    queue_rx: Arc<Mutex<mpsc::Receiver<ChannelMessage>>>,
}

impl Runtime {
    /// Wire a runtime with explicit oracles (tests inject scripted ones).
    pub fn assemble(
        config: &Config,
        shared: Shared,
        reactive_oracle: DecisionOracle,
        proactive_oracle: DecisionOracle,
    ) -> Result<Self> {
        let checkins = CheckinPlan::from_config(&config.scheduler.checkins)
            .context("Invalid check-in schedule")?;
        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_CAPACITY);
        let (queue_tx, queue_rx) = mpsc::channel(INBOUND_CAPACITY);

        Ok(Self {
            intake: Arc::new(Intake::new(shared.clone(), queue_tx)),
            reactive: Arc::new(ReactiveHandler::new(
                config,
                shared.clone(),
                reactive_oracle,
            )),
            scheduler: Arc::new(ProactiveScheduler::new(
                config,
                shared.clone(),
                proactive_oracle,
                checkins,
            )),
            shared,
            inbound_tx,
            inbound_rx: Arc::new(Mutex::new(inbound_rx)),
            queue_rx: Arc::new(Mutex::new(queue_rx)),
        })
    }

    /// Wire a runtime from configuration alone.
    pub fn from_config(config: &Config, channel: Arc<dyn Channel>) -> Result<Self> {
        let shared = build_shared(config, channel, Arc::new(SystemClock))?;
        Self::assemble(
            config,
            shared,
            oracle_for(config, OracleMode::Reactive),
            oracle_for(config, OracleMode::Proactive),
        )
    }

    /// Sender the channel listener feeds.
    pub fn inbound(&self) -> mpsc::Sender<ChannelMessage> {
        self.inbound_tx.clone()
    }

    /// Route listener output through the intake.
    pub fn spawn_intake(&self, policy: RestartPolicy) -> JoinHandle<()> {
        let intake = Arc::clone(&self.intake);
        let inbound_rx = Arc::clone(&self.inbound_rx);
        spawn_component_supervisor("intake", policy, move || {
            Arc::clone(&intake).route(Arc::clone(&inbound_rx))
        })
    }

    /// Consume queued messages as debounced conversation turns.
    pub fn spawn_reactive(&self, policy: RestartPolicy) -> JoinHandle<()> {
        let reactive = Arc::clone(&self.reactive);
        let queue_rx = Arc::clone(&self.queue_rx);
        spawn_component_supervisor("reactive", policy, move || {
            Arc::clone(&reactive).run(Arc::clone(&queue_rx))
        })
    }

    /// Spawn the intake router, reactive consumer, scheduler and check-in
    /// loops. The channel listener is left to the caller.
    pub fn spawn_core(&self, config: &Config) -> Vec<JoinHandle<()>> {
        let policy = RestartPolicy::from_config(&config.reliability);
        let mut handles = vec![self.spawn_intake(policy), self.spawn_reactive(policy)];

        if config.scheduler.enabled {
            let scheduler = Arc::clone(&self.scheduler);
            handles.push(spawn_component_supervisor("scheduler", policy, move || {
                Arc::clone(&scheduler).run()
            }));
        } else {
            tracing::info!("Proactive scheduler disabled");
        }

        if self.scheduler.checkins().is_empty() {
            tracing::info!("No check-ins configured");
        } else {
            let scheduler = Arc::clone(&self.scheduler);
            handles.push(spawn_component_supervisor("checkins", policy, move || {
                Arc::clone(&scheduler).run_checkins()
            }));
        }

        handles
    }
}

/// Run the agent on `kind` until Ctrl-C (or, for the CLI channel, until
/// stdin closes).
pub async fn run(config: Config, kind: ChannelKind) -> Result<()> {
    let channel = build_channel(kind, &config)?;
    if !channel.health_check().await {
        tracing::warn!(channel = channel.name(), "Channel health check failed, starting anyway");
    }

    let runtime = Runtime::from_config(&config, Arc::clone(&channel))?;
    let state = runtime.shared.session.load().await;
    tracing::info!(
        channel = channel.name(),
        unanswered = state.unanswered_count,
        test_mode = config.test_mode,
        "Spark starting"
    );

    let mut handles = runtime.spawn_core(&config);
    let policy = RestartPolicy::from_config(&config.reliability);

    let mut listener_done: JoinHandle<()> = match kind {
        ChannelKind::Telegram => {
            let listener_channel = Arc::clone(&channel);
            let inbound = runtime.inbound();
            spawn_component_supervisor("listener", policy, move || {
                let channel = Arc::clone(&listener_channel);
                let tx = inbound.clone();
                async move { channel.listen(tx).await }
            })
        }
        ChannelKind::Cli => {
            let cli_channel = Arc::clone(&channel);
            let tx = runtime.inbound();
            tokio::spawn(async move {
                if let Err(e) = cli_channel.listen(tx).await {
                    tracing::error!(error = %e, "CLI listener failed");
                }
            })
        }
    };

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl-C")?;
            tracing::info!("Shutdown requested");
        }
        _ = &mut listener_done => {
            tracing::info!("Listener finished, shutting down");
        }
    }

    handles.push(listener_done);
    for handle in &handles {
        handle.abort();
    }
    for handle in handles {
        let _ = handle.await;
    }
    Ok(())
}
