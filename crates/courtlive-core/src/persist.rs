// ── Durable state ──
//
// What survives a restart: connection configuration (including the
// activation flag) and component bindings. Runtime status such as the
// last error or last update time is never written.
//
// Saves are debounced: callers mark the queue dirty and a background
// flusher coalesces bursts into a single write of the latest snapshot.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::model::{ComponentBinding, Connection, ConnectionId, ProviderKind};
use crate::registry::Registry;

/// Current on-disk format version.
pub const STATE_VERSION: u32 = 1;

// ── Persisted shapes ────────────────────────────────────────────────

/// Everything the engine saves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    pub version: u32,
    #[serde(default)]
    pub connections: Vec<ConnectionRecord>,
    #[serde(default)]
    pub bindings: Vec<ComponentBinding>,
}

impl PersistedState {
    pub fn new(connections: Vec<ConnectionRecord>, bindings: Vec<ComponentBinding>) -> Self {
        Self {
            version: STATE_VERSION,
            connections,
            bindings,
        }
    }
}

impl Default for PersistedState {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}

/// Saved form of a [`Connection`].
///
/// The credential is stored as plain text; the state file should live in
/// a user-private directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRecord {
    pub id: ConnectionId,
    pub name: String,
    pub provider: ProviderKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub court: Option<String>,
    #[serde(default)]
    pub normalize: bool,
    pub poll_interval_secs: u64,
    #[serde(default)]
    pub is_active: bool,
}

impl From<&Connection> for ConnectionRecord {
    fn from(conn: &Connection) -> Self {
        Self {
            id: conn.id,
            name: conn.name.clone(),
            provider: conn.provider,
            endpoint: conn.endpoint.clone(),
            credential: conn
                .credential
                .as_ref()
                .map(|c| c.expose_secret().to_owned()),
            court: conn.court.clone(),
            normalize: conn.normalize,
            poll_interval_secs: conn.poll_interval_secs,
            is_active: conn.is_active,
        }
    }
}

impl ConnectionRecord {
    pub(crate) fn into_connection(self) -> Connection {
        Connection {
            id: self.id,
            name: self.name,
            provider: self.provider,
            endpoint: self.endpoint,
            credential: self.credential.map(SecretString::from),
            court: self.court,
            normalize: self.normalize,
            poll_interval_secs: self.poll_interval_secs.max(1),
            is_active: self.is_active,
            activated_at: None,
            last_updated_at: None,
            last_error: None,
        }
    }
}

// ── StateStore ──────────────────────────────────────────────────────

/// Durable load/save of [`PersistedState`].
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn load(&self) -> Result<PersistedState, CoreError>;
    async fn save(&self, state: &PersistedState) -> Result<(), CoreError>;
}

/// Pretty-printed JSON file. A missing file loads as empty state.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl StateStore for JsonFileStore {
    async fn load(&self) -> Result<PersistedState, CoreError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no saved state, starting empty");
                return Ok(PersistedState::default());
            }
            Err(e) => {
                return Err(CoreError::persistence(format!(
                    "cannot read {}: {e}",
                    self.path.display()
                )));
            }
        };

        let state: PersistedState = serde_json::from_str(&raw).map_err(|e| {
            CoreError::persistence(format!("cannot parse {}: {e}", self.path.display()))
        })?;
        if state.version > STATE_VERSION {
            return Err(CoreError::persistence(format!(
                "{} was written by a newer version (format {})",
                self.path.display(),
                state.version
            )));
        }
        Ok(state)
    }

    async fn save(&self, state: &PersistedState) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(CoreError::persistence)?;
            }
        }
        let json = serde_json::to_string_pretty(state).map_err(CoreError::persistence)?;

        // Write-then-rename so a crash never leaves a truncated file.
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(CoreError::persistence)?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(CoreError::persistence)?;
        Ok(())
    }
}

// ── Debounced save queue ────────────────────────────────────────────

/// Dirty flag plus wake-up for the background flusher.
#[derive(Default)]
pub(crate) struct PersistQueue {
    dirty: AtomicBool,
    notify: Notify,
    saves: AtomicU64,
    last_error: Mutex<Option<String>>,
    load_failed: AtomicBool,
}

impl PersistQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record that the registry changed. Never blocks.
    pub(crate) fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    /// Number of successful saves so far.
    pub(crate) fn save_count(&self) -> u64 {
        self.saves.load(Ordering::SeqCst)
    }

    /// While set, flushes are refused so the unreadable file stays as is.
    pub(crate) fn set_load_failed(&self, failed: bool) {
        self.load_failed.store(failed, Ordering::SeqCst);
    }

    pub(crate) fn last_error(&self) -> Option<String> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Save the current registry snapshot if anything changed.
    ///
    /// On failure the queue stays dirty so the next flush retries. After a
    /// failed load nothing is written until a load succeeds.
    pub(crate) async fn flush(
        &self,
        registry: &Registry,
        store: &dyn StateStore,
    ) -> Result<bool, CoreError> {
        if self.load_failed.load(Ordering::SeqCst) {
            if !self.is_dirty() {
                return Ok(false);
            }
            return Err(CoreError::persistence(
                "saved state could not be loaded; refusing to overwrite it",
            ));
        }
        if !self.dirty.swap(false, Ordering::SeqCst) {
            return Ok(false);
        }

        let snapshot = registry.to_persisted();
        match store.save(&snapshot).await {
            Ok(()) => {
                self.saves.fetch_add(1, Ordering::SeqCst);
                *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = None;
                debug!(
                    connections = snapshot.connections.len(),
                    bindings = snapshot.bindings.len(),
                    "state saved"
                );
                Ok(true)
            }
            Err(e) => {
                warn!(error = %e, "failed to save state");
                self.dirty.store(true, Ordering::SeqCst);
                *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) =
                    Some(e.to_string());
                Err(e)
            }
        }
    }

    pub(crate) fn record_error(&self, error: &CoreError) {
        *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = Some(error.to_string());
    }
}

/// Background flusher: waits for a change, lets the debounce window
/// absorb any burst that follows, then writes one snapshot.
pub(crate) async fn persist_task(
    queue: Arc<PersistQueue>,
    registry: Arc<Registry>,
    store: Arc<dyn StateStore>,
    debounce: Duration,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = queue.notify.notified() => {}
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(debounce) => {}
        }

        // Errors are recorded on the queue; the next change retries.
        let _ = queue.flush(&registry, store.as_ref()).await;
    }

    info!("persistence flusher stopped");
}
