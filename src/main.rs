use anyhow::{Context, Result};
use clap::Parser;
use spark::Config;
use spark::cli::Cli;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// `SPARK_LOG=debug` and friends; anything unparseable falls back to INFO.
fn log_level() -> Level {
    std::env::var("SPARK_LOG")
        .ok()
        .and_then(|raw| raw.trim().parse::<Level>().ok())
        .unwrap_or(Level::INFO)
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level())
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    let cli = Cli::parse();
    let config = Config::load_or_init()?;
    spark::app::dispatch(cli, config).await
}
