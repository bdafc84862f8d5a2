use crate::channels::{ChannelKind, build_channel};
use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::daemon::Runtime;
use crate::knowledge::KnowledgeGateway;
use crate::session::SessionStore;
use anyhow::{Context, Result};

/// Route a parsed command line to its handler.
pub async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Run { channel } => crate::daemon::run(config, channel).await,
        Commands::Tick { channel } => run_single_tick(&config, channel).await,
        Commands::State => print_state(&config).await,
        Commands::Access => print_access(&config),
    }
}

async fn run_single_tick(config: &Config, kind: ChannelKind) -> Result<()> {
    let channel = build_channel(kind, config)?;
    let runtime = Runtime::from_config(config, channel)?;
    let now = runtime.shared.clock.now();
    let outcome = runtime.scheduler.run_tick(now).await;
    println!("{outcome}");
    Ok(())
}

fn open_gateway(config: &Config) -> Result<KnowledgeGateway> {
    let root = config.knowledge_root();
    KnowledgeGateway::local(&root, &config.knowledge)
        .with_context(|| format!("Failed to open knowledge root {}", root.display()))
}

async fn print_state(config: &Config) -> Result<()> {
    let gateway = open_gateway(config)?;
    let store = SessionStore::new(gateway.storage(), config.knowledge.state_path.clone());
    let state = store.load().await;
    let rendered =
        serde_json::to_string_pretty(&state).context("Failed to render session state")?;
    println!("{rendered}");
    Ok(())
}

fn print_access(config: &Config) -> Result<()> {
    let gateway = open_gateway(config)?;
    println!("{}", gateway.access_summary());
    Ok(())
}
