// ── Engine ──
//
// Facade over the registry, the data store, the pollers, the persistence
// flusher, and the court sync coordinator. Cheaply cloneable: every clone
// shares the same state.
//
// Mutating methods spawn or cancel tasks and must be called from within a
// tokio runtime.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backend::{DisplaySource, ManualScoreSource, MatchBackend};
use crate::config::EngineConfig;
use crate::error::CoreError;
use crate::model::{
    BindingPatch, ComponentBinding, Connection, ConnectionDraft, ConnectionId, ConnectionPatch,
    MatchState, ProviderKind,
};
use crate::persist::{self, PersistQueue, StateStore};
use crate::poller::{self, PollContext, PollerHandle};
use crate::provider::ProviderSources;
use crate::registry::Registry;
use crate::resolve::resolve_path;
use crate::store::{CourtEntry, DataStore};
use crate::stream::CourtStream;
use crate::sync::{CourtSyncStatus, SyncCoordinator, SyncReport};
use courtlive_api::MatchInfo;

/// The collaborators an engine talks to.
pub struct Collaborators {
    pub backend: Arc<dyn MatchBackend>,
    pub displays: Arc<dyn DisplaySource>,
    pub manual: Arc<dyn ManualScoreSource>,
    pub state: Arc<dyn StateStore>,
}

/// Live data engine.
///
/// # Lifecycle
///
/// 1. [`new()`](Self::new) wires collaborators; nothing runs yet.
/// 2. [`start()`](Self::start) loads saved state, resumes pollers for
///    connections saved as active, and starts the persistence flusher.
/// 3. [`start_sync()`](Self::start_sync) starts display-scoped court sync.
/// 4. [`shutdown()`](Self::shutdown) stops every task, writes any pending
///    change, and clears the connection cache. It is terminal.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    config: EngineConfig,
    registry: Arc<Registry>,
    store: Arc<DataStore>,
    poll_ctx: Arc<PollContext>,
    state_store: Arc<dyn StateStore>,
    persist: Arc<PersistQueue>,
    coordinator: Arc<SyncCoordinator>,
    pollers: DashMap<ConnectionId, PollerHandle>,
    cancel: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    started: AtomicBool,
}

impl Engine {
    pub fn new(config: EngineConfig, collaborators: Collaborators) -> Self {
        let registry = Arc::new(Registry::new());
        let store = Arc::new(DataStore::new());
        let sources = Arc::new(ProviderSources {
            backend: Arc::clone(&collaborators.backend),
            manual: collaborators.manual,
        });
        let poll_ctx = Arc::new(PollContext {
            registry: Arc::clone(&registry),
            store: Arc::clone(&store),
            sources,
            backoff: config.backoff,
        });
        let coordinator = Arc::new(SyncCoordinator::new(
            Arc::clone(&store),
            collaborators.backend,
            collaborators.displays,
            config.sync_interval,
            config.court_max_age,
        ));

        Self {
            inner: Arc::new(EngineInner {
                config,
                registry,
                store,
                poll_ctx,
                state_store: collaborators.state,
                persist: Arc::new(PersistQueue::new()),
                coordinator,
                pollers: DashMap::new(),
                cancel: CancellationToken::new(),
                tasks: Mutex::new(Vec::new()),
                started: AtomicBool::new(false),
            }),
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Load saved state and start background work. Idempotent.
    ///
    /// A load failure is returned and remembered in
    /// [`persistence_error()`](Self::persistence_error). The engine then
    /// stays usable in memory but never overwrites the unreadable state.
    pub async fn start(&self) -> Result<(), CoreError> {
        if self.inner.started.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let state = match self.inner.state_store.load().await {
            Ok(state) => state,
            Err(e) => {
                warn!(error = %e, "cannot load saved state");
                self.inner.persist.set_load_failed(true);
                self.inner.persist.record_error(&e);
                self.inner.started.store(false, Ordering::SeqCst);
                return Err(e);
            }
        };
        self.inner.persist.set_load_failed(false);
        self.inner.registry.load(state);

        let flusher = tokio::spawn(persist::persist_task(
            Arc::clone(&self.inner.persist),
            Arc::clone(&self.inner.registry),
            Arc::clone(&self.inner.state_store),
            self.inner.config.persist_debounce,
            self.inner.cancel.child_token(),
        ));
        self.track(flusher);

        let now = Utc::now();
        let active = self.inner.registry.active_ids();
        for id in &active {
            if let Some(mut conn) = self.inner.registry.connections.get_mut(id) {
                conn.activated_at = Some(now);
            }
            self.ensure_poller(*id);
        }

        info!(
            connections = self.inner.registry.connections.len(),
            active = active.len(),
            "engine started"
        );
        Ok(())
    }

    /// Stop every task, write pending changes, and clear the connection
    /// cache.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        for entry in &self.inner.pollers {
            entry.value().stop();
        }
        let pollers: Vec<ConnectionId> = self.inner.pollers.iter().map(|r| *r.key()).collect();
        let mut handles: Vec<JoinHandle<()>> = pollers
            .iter()
            .filter_map(|id| self.inner.pollers.remove(id))
            .map(|(_, h)| h.task)
            .collect();
        handles.extend(
            self.inner
                .tasks
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .drain(..),
        );
        for handle in handles {
            let _ = handle.await;
        }

        if let Err(e) = self.flush().await {
            warn!(error = %e, "final save failed");
        }
        self.inner.store.clear_all_live();
        self.inner.started.store(false, Ordering::SeqCst);
        info!("engine stopped");
    }

    /// Write pending changes now. Returns `true` if anything was saved.
    pub async fn flush(&self) -> Result<bool, CoreError> {
        self.inner
            .persist
            .flush(&self.inner.registry, self.inner.state_store.as_ref())
            .await
    }

    /// The most recent load or save failure, cleared by the next
    /// successful save.
    pub fn persistence_error(&self) -> Option<String> {
        self.inner.persist.last_error()
    }

    /// `true` when registry changes are waiting to be saved.
    pub fn has_pending_changes(&self) -> bool {
        self.inner.persist.is_dirty()
    }

    // ── Connections ──────────────────────────────────────────────────

    pub fn add_connection(&self, draft: ConnectionDraft) -> Result<ConnectionId, CoreError> {
        let id = self.inner.registry.add_connection(draft)?;
        info!(connection = %id, "connection added");
        self.inner.persist.mark_dirty();
        Ok(id)
    }

    /// Edit a connection. An active connection's poller is restarted so
    /// the new settings apply from the next tick.
    pub fn update_connection(
        &self,
        id: &ConnectionId,
        patch: ConnectionPatch,
    ) -> Result<Connection, CoreError> {
        let updated = self.inner.registry.update_connection(id, patch)?;
        if updated.is_active {
            self.stop_poller(id);
            self.ensure_poller(*id);
        }
        debug!(connection = %id, "connection updated");
        self.inner.persist.mark_dirty();
        Ok(updated)
    }

    /// Remove a connection, its cached payload, and every binding that
    /// reads from it.
    pub fn remove_connection(&self, id: &ConnectionId) -> Result<Connection, CoreError> {
        let (removed, orphaned) = self.inner.registry.remove_connection(id)?;
        self.stop_poller(id);
        self.inner.store.clear_live(id);
        info!(
            connection = %id,
            bindings_removed = orphaned.len(),
            "connection removed"
        );
        self.inner.persist.mark_dirty();
        Ok(removed)
    }

    /// Start polling a connection. Activating an active connection is a
    /// no-op.
    pub fn activate_connection(&self, id: &ConnectionId) -> Result<(), CoreError> {
        let changed = self.inner.registry.set_active(id, true, Utc::now())?;
        self.ensure_poller(*id);
        if changed {
            info!(connection = %id, "connection activated");
            self.inner.persist.mark_dirty();
        }
        Ok(())
    }

    /// Stop polling a connection. Its last payload stays readable.
    pub fn deactivate_connection(&self, id: &ConnectionId) -> Result<(), CoreError> {
        let changed = self.inner.registry.set_active(id, false, Utc::now())?;
        self.stop_poller(id);
        if changed {
            info!(connection = %id, "connection deactivated");
            self.inner.persist.mark_dirty();
        }
        Ok(())
    }

    pub fn get_connection(&self, id: &ConnectionId) -> Option<Connection> {
        self.inner.registry.connection(id)
    }

    /// All connections, ordered by name.
    pub fn connections(&self) -> Vec<Connection> {
        self.inner.registry.connections()
    }

    /// Check that a connection's source answers.
    ///
    /// Local providers always pass. A feed that rejects the request reports
    /// `Ok(false)`; invalid configuration is an error.
    pub async fn test_connection(&self, id: &ConnectionId) -> Result<bool, CoreError> {
        let conn = self
            .get_connection(id)
            .ok_or(CoreError::ConnectionNotFound { id: *id })?;
        let backend = &self.inner.poll_ctx.sources.backend;

        match conn.provider {
            ProviderKind::Simulated | ProviderKind::ManualConsole => Ok(true),
            ProviderKind::PolledApi => {
                let endpoint = require_endpoint(&conn)?;
                backend.probe(endpoint, conn.credential.as_ref()).await
            }
            ProviderKind::StreamedFeed => {
                let result = match &conn.court {
                    Some(court) => backend
                        .fetch_courts(std::slice::from_ref(court))
                        .await
                        .map(|_| ()),
                    None => backend.fetch_recent().await.map(|_| ()),
                };
                match result {
                    Ok(()) => Ok(true),
                    Err(CoreError::Fetch { message }) => {
                        debug!(connection = %id, %message, "feed probe failed");
                        Ok(false)
                    }
                    Err(e) => Err(e),
                }
            }
        }
    }

    /// Matches known to a polled-api connection's service.
    pub async fn list_matches(&self, id: &ConnectionId) -> Result<Vec<MatchInfo>, CoreError> {
        let conn = self
            .get_connection(id)
            .ok_or(CoreError::ConnectionNotFound { id: *id })?;
        if conn.provider != ProviderKind::PolledApi {
            return Err(CoreError::validation(
                "provider",
                format!("match listing needs a polled-api connection, not {}", conn.provider),
            ));
        }
        let endpoint = require_endpoint(&conn)?;
        self.inner
            .poll_ctx
            .sources
            .backend
            .list_matches(endpoint, conn.credential.as_ref())
            .await
    }

    // ── Bindings ─────────────────────────────────────────────────────

    /// Bind a component, replacing its previous binding if any.
    pub fn add_binding(
        &self,
        binding: ComponentBinding,
    ) -> Result<Option<ComponentBinding>, CoreError> {
        let replaced = self.inner.registry.add_binding(binding)?;
        self.inner.persist.mark_dirty();
        Ok(replaced)
    }

    pub fn update_binding(
        &self,
        component_id: &str,
        patch: BindingPatch,
    ) -> Result<ComponentBinding, CoreError> {
        let updated = self.inner.registry.update_binding(component_id, patch)?;
        self.inner.persist.mark_dirty();
        Ok(updated)
    }

    pub fn remove_binding(&self, component_id: &str) -> Result<ComponentBinding, CoreError> {
        let removed = self.inner.registry.remove_binding(component_id)?;
        self.inner.persist.mark_dirty();
        Ok(removed)
    }

    pub fn get_binding(&self, component_id: &str) -> Option<ComponentBinding> {
        self.inner.registry.binding(component_id)
    }

    pub fn bindings(&self) -> Vec<ComponentBinding> {
        self.inner.registry.bindings()
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Current value for a bound component.
    ///
    /// `None` when the component is unbound, its connection has no data
    /// yet, or the path does not resolve.
    pub fn get_value(&self, component_id: &str) -> Option<MatchState> {
        let binding = self.inner.registry.binding(component_id)?;
        let payload = self.inner.store.live(&binding.connection_id)?;
        resolve_path(&payload, &binding.data_path).cloned()
    }

    /// Latest payload for a connection.
    pub fn get_live_data(&self, id: &ConnectionId) -> Option<Arc<MatchState>> {
        self.inner.store.live(id)
    }

    /// `true` when nothing was written in the last `max_age_minutes`.
    pub fn is_stale(&self, max_age_minutes: u32) -> bool {
        self.is_stale_at(Utc::now(), max_age_minutes)
    }

    pub fn is_stale_at(&self, now: DateTime<Utc>, max_age_minutes: u32) -> bool {
        self.inner
            .store
            .is_stale_at(now, TimeDelta::minutes(i64::from(max_age_minutes)))
    }

    pub fn last_write(&self) -> Option<DateTime<Utc>> {
        self.inner.store.last_write()
    }

    /// The data store, for subscriptions and direct reads.
    pub fn store(&self) -> &DataStore {
        &self.inner.store
    }

    // ── Courts ───────────────────────────────────────────────────────

    /// Cached court names, sorted.
    pub fn available_courts(&self) -> Vec<String> {
        self.inner.store.court_names()
    }

    pub fn court_data(&self, court: &str) -> Option<Arc<CourtEntry>> {
        self.inner.store.court(court)
    }

    pub fn subscribe_courts(&self) -> CourtStream {
        self.inner.store.subscribe_courts()
    }

    pub fn sync_status(&self) -> CourtSyncStatus {
        self.inner.coordinator.status()
    }

    /// Start periodic court sync. `interval` overrides the configured
    /// cadence.
    pub fn start_sync(&self, interval: Option<Duration>) -> Result<(), CoreError> {
        self.inner.coordinator.start(interval, &self.inner.cancel)
    }

    pub fn stop_sync(&self) -> Result<(), CoreError> {
        self.inner.coordinator.stop()
    }

    /// Run one sync pass immediately.
    pub async fn sync_now(&self) -> Result<SyncReport, CoreError> {
        self.inner.coordinator.sync_once().await
    }

    // ── Poller management ────────────────────────────────────────────

    fn ensure_poller(&self, id: ConnectionId) {
        let is_active = self
            .inner
            .registry
            .connection(&id)
            .is_some_and(|c| c.is_active);

        match self.inner.pollers.entry(id) {
            Entry::Occupied(mut entry) => {
                if !entry.get().is_live() && is_active {
                    entry.insert(self.spawn_poller(id));
                }
            }
            Entry::Vacant(entry) => {
                if is_active {
                    entry.insert(self.spawn_poller(id));
                }
            }
        }
    }

    fn spawn_poller(&self, id: ConnectionId) -> PollerHandle {
        poller::spawn(
            Arc::clone(&self.inner.poll_ctx),
            id,
            self.inner.cancel.child_token(),
        )
    }

    fn stop_poller(&self, id: &ConnectionId) {
        if let Some((_, handle)) = self.inner.pollers.remove(id) {
            handle.stop();
        }
    }

    fn track(&self, task: JoinHandle<()>) {
        self.inner
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(task);
    }
}

fn require_endpoint(conn: &Connection) -> Result<&str, CoreError> {
    conn.endpoint
        .as_deref()
        .ok_or_else(|| CoreError::validation("endpoint", "connection has no endpoint"))
}
