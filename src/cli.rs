use crate::channels::ChannelKind;
use clap::{Parser, Subcommand};

/// `spark` - a proactive accountability companion that checks in over chat.
#[derive(Parser, Debug)]
#[command(name = "spark")]
#[command(version)]
#[command(about = "A proactive accountability companion.", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the agent: reactive conversation plus proactive ticks and check-ins
    Run {
        /// Transport to talk through (telegram, cli)
        #[arg(long, value_enum, ignore_case = true, default_value_t = ChannelKind::Telegram)]
        channel: ChannelKind,
    },

    /// Evaluate one proactive tick now and print the outcome
    Tick {
        /// Transport a resulting message is sent through (telegram, cli)
        #[arg(long, value_enum, ignore_case = true, default_value_t = ChannelKind::Cli)]
        channel: ChannelKind,
    },

    /// Print the persisted session state
    State,

    /// Print which knowledge paths are readable, writable and blocked
    Access,
}
