//! Cross-path signalling between the reactive and proactive control paths.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Mutex, MutexGuard};

/// Tracks inbound user messages that no completed turn has consumed yet,
/// and owns the single outbound dispatch slot.
///
/// The scheduler treats a non-zero count as "the user is talking" and
/// stays quiet. Both paths send through [`InteractionCoordinator::dispatch_slot`],
/// so a proactive send cannot land between the reactive path's lines.
#[derive(Debug, Default)]
pub struct InteractionCoordinator {
    pending: AtomicUsize,
    dispatch: Mutex<()>,
}

impl InteractionCoordinator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Raise the signal for one inbound message. Called before buffering.
    pub fn begin_user_interaction(&self) {
        let now = self.pending.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(pending = now, "User interaction started");
    }

    /// Release the signal for `consumed` messages handled by a finished turn.
    pub fn end_user_interaction(&self, consumed: usize) {
        let result = self
            .pending
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                Some(n.saturating_sub(consumed))
            });
        let before = result.unwrap_or_else(|n| n);
        tracing::debug!(
            pending = before.saturating_sub(consumed),
            consumed,
            "User interaction ended"
        );
    }

    pub fn is_user_interacting(&self) -> bool {
        self.pending.load(Ordering::SeqCst) > 0
    }

    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// RAII form of begin/end for one message.
    pub fn ticket(self: &Arc<Self>) -> InteractionTicket {
        self.begin_user_interaction();
        InteractionTicket {
            coordinator: Arc::clone(self),
            released: false,
        }
    }

    /// Release `consumed` messages when the returned guard drops, however the
    /// turn that consumed them ends.
    pub fn release_on_drop(&self, consumed: usize) -> InteractionRelease<'_> {
        InteractionRelease {
            coordinator: self,
            consumed,
        }
    }

    /// Wait for the dispatch slot. Used by the reactive path.
    pub async fn dispatch_slot(&self) -> MutexGuard<'_, ()> {
        self.dispatch.lock().await
    }

    /// Dispatch slot for a proactive send: `None` if the user is interacting
    /// once the slot is held.
    pub async fn proactive_slot(&self) -> Option<MutexGuard<'_, ()>> {
        let guard = self.dispatch.lock().await;
        if self.is_user_interacting() {
            return None;
        }
        Some(guard)
    }
}

/// One raised unit of the interaction signal, released on drop unless
/// ownership was handed over with [`InteractionTicket::into_pending`].
#[derive(Debug)]
pub struct InteractionTicket {
    coordinator: Arc<InteractionCoordinator>,
    released: bool,
}

impl InteractionTicket {
    /// Keep the signal raised and leave releasing it to whoever consumes the
    /// message (the reactive consumer ends the interaction after its turn).
    pub fn into_pending(mut self) {
        self.released = true;
    }
}

impl Drop for InteractionTicket {
    fn drop(&mut self) {
        if !self.released {
            self.coordinator.end_user_interaction(1);
        }
    }
}

/// Releases a finished (or abandoned) turn's messages on drop.
#[derive(Debug)]
pub struct InteractionRelease<'a> {
    coordinator: &'a InteractionCoordinator,
    consumed: usize,
}

impl Drop for InteractionRelease<'_> {
    fn drop(&mut self) {
        self.coordinator.end_user_interaction(self.consumed);
    }
}
