pub mod cli;
pub mod outbound;
pub mod telegram;
pub mod traits;

pub use cli::CliChannel;
pub use outbound::{Outbound, Pacing};
pub use telegram::TelegramChannel;
pub use traits::{Channel, ChannelFuture, ChannelMessage};

use crate::config::Config;
use crate::error::TransportError;
use std::sync::Arc;
use strum::{Display, EnumString};

/// Which transport the daemon talks through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, clap::ValueEnum)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ChannelKind {
    #[default]
    Telegram,
    Cli,
}

/// Build the channel for `kind`. Telegram needs both a token and the one
/// authorized user id.
pub fn build_channel(kind: ChannelKind, config: &Config) -> Result<Arc<dyn Channel>, TransportError> {
    match kind {
        ChannelKind::Cli => Ok(Arc::new(CliChannel::new())),
        ChannelKind::Telegram => {
            let telegram = &config.telegram;
            if !telegram.is_configured() {
                return Err(TransportError::NotConfigured(
                    "telegram needs bot_token and allowed_user_id".into(),
                ));
            }
            let token = telegram.bot_token.clone().unwrap_or_default();
            Ok(Arc::new(TelegramChannel::new(
                token,
                telegram.allowed_user_id.clone(),
            )))
        }
    }
}
