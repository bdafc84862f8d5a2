use super::traits::{Channel, ChannelFuture, ChannelMessage};
use chrono::Local;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, BufReader};

const CLI_USER: &str = "user";

/// Terminal channel: stdin in, stdout out. For local runs without a bot.
pub struct CliChannel;

impl CliChannel {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CliChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Forward non-empty lines until EOF, `/quit`, or the receiver goes away.
async fn forward_lines<R>(reader: R, tx: &tokio::sync::mpsc::Sender<ChannelMessage>) -> usize
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut forwarded = 0;
    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "/quit" || line == "/exit" {
            break;
        }
        let msg = ChannelMessage::new(CLI_USER, line, "cli", Local::now());
        if tx.send(msg).await.is_err() {
            break;
        }
        forwarded += 1;
    }
    forwarded
}

impl Channel for CliChannel {
    fn name(&self) -> &str {
        "cli"
    }

    fn send<'a>(&'a self, message: &'a str, _recipient: &'a str) -> ChannelFuture<'a, ()> {
        Box::pin(async move {
            println!("spark: {message}");
            Ok(())
        })
    }

    fn listen<'a>(
        &'a self,
        tx: tokio::sync::mpsc::Sender<ChannelMessage>,
    ) -> ChannelFuture<'a, ()> {
        Box::pin(async move {
            let forwarded = forward_lines(BufReader::new(io::stdin()), &tx).await;
            tracing::info!(forwarded, "CLI input closed");
            Ok(())
        })
    }

    fn default_recipient(&self) -> Option<&str> {
        Some(CLI_USER)
    }
}
