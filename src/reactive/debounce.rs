use crate::channels::ChannelMessage;
use std::time::Duration;
use tokio::sync::mpsc;

/// Wait for the next message, then keep collecting until `window` passes
/// with no new arrival. `None` once the queue is closed and drained.
pub async fn collect_burst(
    rx: &mut mpsc::Receiver<ChannelMessage>,
    window: Duration,
) -> Option<Vec<ChannelMessage>> {
    let first = rx.recv().await?;
    let mut burst = vec![first];
    loop {
        match tokio::time::timeout(window, rx.recv()).await {
            Ok(Some(next)) => burst.push(next),
            Ok(None) | Err(_) => break,
        }
    }
    Some(burst)
}

/// One turn's text from a burst.
pub fn combine(burst: &[ChannelMessage]) -> String {
    burst
        .iter()
        .map(|m| m.content.trim())
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
