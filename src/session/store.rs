use super::state::SessionState;
use crate::error::StorageError;
use crate::knowledge::Storage;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Durable home of [`SessionState`].
///
/// Nothing is cached between calls: every `load` goes to storage so the two
/// control paths always see the last writer's value. One mutex covers each
/// load-mutate-save cycle. A save that fails twice keeps the value as
/// `pending`; it is flushed (or handed back) by the next access.
pub struct SessionStore {
    storage: Arc<dyn Storage>,
    path: String,
    pending: Mutex<Option<SessionState>>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn Storage>, path: impl Into<String>) -> Self {
        Self {
            storage,
            path: path.into(),
            pending: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub async fn load(&self) -> SessionState {
        let mut pending = self.pending.lock().await;
        self.load_locked(&mut pending).await
    }

    pub async fn save(&self, state: &SessionState) -> Result<(), StorageError> {
        let mut pending = self.pending.lock().await;
        self.save_locked(&mut pending, state).await
    }

    /// Reload, mutate and persist as one critical section. A persistence
    /// failure is logged and the mutated value retained; the closure's
    /// result is returned either way.
    pub async fn update<R>(&self, mutate: impl FnOnce(&mut SessionState) -> R) -> R {
        let mut pending = self.pending.lock().await;
        let mut state = self.load_locked(&mut pending).await;
        let out = mutate(&mut state);
        if let Err(e) = self.save_locked(&mut pending, &state).await {
            tracing::error!(path = %self.path, error = %e, "Session state kept in memory after failed save");
        }
        out
    }

    pub async fn has_pending(&self) -> bool {
        self.pending.lock().await.is_some()
    }

    async fn load_locked(&self, pending: &mut Option<SessionState>) -> SessionState {
        if let Some(unsaved) = pending.clone() {
            match self.write_once(&unsaved).await {
                Ok(()) => {
                    tracing::info!(path = %self.path, "Flushed pending session state");
                    *pending = None;
                }
                Err(e) => {
                    tracing::warn!(path = %self.path, error = %e, "Pending session state still unsaved");
                    return unsaved;
                }
            }
        }

        match self.storage.read(&self.path).await {
            Ok(Some(text)) => match serde_json::from_str(&text) {
                Ok(state) => state,
                Err(e) => {
                    self.quarantine(&text, &e).await;
                    SessionState::default()
                }
            },
            Ok(None) => SessionState::default(),
            Err(e) => {
                tracing::warn!(path = %self.path, error = %e, "Session state read failed, using defaults");
                SessionState::default()
            }
        }
    }

    /// Copy an unparseable state file aside before the next save replaces it.
    async fn quarantine(&self, text: &str, error: &serde_json::Error) {
        let backup = self.backup_path();
        match self.storage.write(&backup, text).await {
            Ok(()) => tracing::error!(
                path = %self.path,
                backup = %backup,
                error = %error,
                "Unreadable session state moved aside, starting from defaults"
            ),
            Err(e) => tracing::error!(
                path = %self.path,
                error = %error,
                backup_error = %e,
                "Unreadable session state could not be backed up, starting from defaults"
            ),
        }
    }

    /// Where an unparseable state file is preserved.
    pub fn backup_path(&self) -> String {
        format!("{}.corrupt", self.path)
    }

    async fn save_locked(
        &self,
        pending: &mut Option<SessionState>,
        state: &SessionState,
    ) -> Result<(), StorageError> {
        let first = match self.write_once(state).await {
            Ok(()) => {
                *pending = None;
                return Ok(());
            }
            Err(e) => e,
        };
        tracing::warn!(path = %self.path, error = %first, "Session state save failed, retrying once");

        match self.write_once(state).await {
            Ok(()) => {
                *pending = None;
                Ok(())
            }
            Err(e) => {
                *pending = Some(state.clone());
                Err(e)
            }
        }
    }

    async fn write_once(&self, state: &SessionState) -> Result<(), StorageError> {
        let body =
            serde_json::to_string_pretty(state).map_err(|e| StorageError::Encode(e.to_string()))?;
        self.storage.write(&self.path, &body).await
    }
}
