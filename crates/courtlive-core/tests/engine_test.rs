#![allow(clippy::unwrap_used)]
// Engine behaviour against in-memory collaborators.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::sync::Notify;

use courtlive_core::{
    Collaborators, ComponentBinding, ConnectionDraft, ConnectionId, ConnectionPatch, CoreError,
    CourtMap, DisplayInstance, Engine, EngineConfig, JsonFileStore, MatchBackend, MatchInfo,
    PersistedState, ProviderKind, SharedManualScore, StateStore, StaticDisplays,
};

// ── Fakes ───────────────────────────────────────────────────────────

#[derive(Default)]
struct FakeBackend {
    fetches: AtomicUsize,
    fail: AtomicBool,
    gate: Mutex<Option<Arc<Notify>>>,
    courts: Mutex<CourtMap>,
    court_calls: Mutex<Vec<Vec<String>>>,
    recent_calls: AtomicUsize,
    payload: Mutex<Option<Value>>,
}

impl FakeBackend {
    fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn set_courts(&self, courts: &[(&str, Value)]) {
        *self.courts.lock().unwrap() = courts
            .iter()
            .map(|(name, v)| ((*name).to_owned(), v.clone()))
            .collect();
    }

    fn hold_fetches(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }
}

#[async_trait]
impl MatchBackend for FakeBackend {
    async fn fetch_one(
        &self,
        _endpoint: &str,
        _credential: Option<&SecretString>,
    ) -> Result<Value, CoreError> {
        let n = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(CoreError::Fetch {
                message: "upstream down".into(),
            });
        }
        if let Some(payload) = self.payload.lock().unwrap().clone() {
            return Ok(payload);
        }
        Ok(json!({ "fetch": n, "score": { "player1Sets": 2 } }))
    }

    async fn fetch_courts(&self, courts: &[String]) -> Result<CourtMap, CoreError> {
        self.court_calls.lock().unwrap().push(courts.to_vec());
        let all = self.courts.lock().unwrap();
        Ok(courts
            .iter()
            .filter_map(|c| all.get(c).map(|v| (c.clone(), v.clone())))
            .collect())
    }

    async fn fetch_recent(&self) -> Result<CourtMap, CoreError> {
        self.recent_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.courts.lock().unwrap().clone())
    }

    async fn probe(
        &self,
        _endpoint: &str,
        _credential: Option<&SecretString>,
    ) -> Result<bool, CoreError> {
        Ok(!self.fail.load(Ordering::SeqCst))
    }

    async fn list_matches(
        &self,
        _endpoint: &str,
        _credential: Option<&SecretString>,
    ) -> Result<Vec<MatchInfo>, CoreError> {
        Ok(Vec::new())
    }
}

#[derive(Default)]
struct MemoryStore {
    saves: AtomicUsize,
    fail: AtomicBool,
    saved: Mutex<Option<PersistedState>>,
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn load(&self) -> Result<PersistedState, CoreError> {
        Ok(self.saved.lock().unwrap().clone().unwrap_or_default())
    }

    async fn save(&self, state: &PersistedState) -> Result<(), CoreError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(CoreError::Persistence {
                message: "disk full".into(),
            });
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        *self.saved.lock().unwrap() = Some(state.clone());
        Ok(())
    }
}

struct Harness {
    engine: Engine,
    backend: Arc<FakeBackend>,
    displays: Arc<StaticDisplays>,
    manual: Arc<SharedManualScore>,
    state: Arc<MemoryStore>,
}

fn harness() -> Harness {
    let backend = Arc::new(FakeBackend::default());
    let displays = Arc::new(StaticDisplays::default());
    let manual = Arc::new(SharedManualScore::new());
    let state = Arc::new(MemoryStore::default());
    let engine = Engine::new(
        EngineConfig::default(),
        Collaborators {
            backend: backend.clone(),
            displays: displays.clone(),
            manual: manual.clone(),
            state: state.clone(),
        },
    );
    Harness {
        engine,
        backend,
        displays,
        manual,
        state,
    }
}

fn polled(name: &str) -> ConnectionDraft {
    ConnectionDraft::new(name, ProviderKind::PolledApi)
        .endpoint("http://scores.test/match/1")
        .poll_interval_secs(1)
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

async fn wait_for_fetches(backend: &FakeBackend, n: usize) {
    while backend.fetches() < n {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}

// ── Resolution ──────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn bound_component_resolves_after_first_tick() {
    let h = harness();
    let id = h.engine.add_connection(polled("Centre")).unwrap();
    h.engine
        .add_binding(ComponentBinding::new("p1-sets", id, "score.player1Sets"))
        .unwrap();
    h.engine
        .add_binding(ComponentBinding::new("p1-games", id, "score.player1Games"))
        .unwrap();

    assert_eq!(h.engine.get_value("p1-sets"), None);

    h.engine.activate_connection(&id).unwrap();
    settle().await;

    assert_eq!(h.engine.get_value("p1-sets"), Some(json!(2)));
    assert_eq!(h.engine.get_value("p1-games"), None);
    assert_eq!(h.engine.get_value("unbound"), None);
}

// ── Poller lifecycle ────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn double_activation_runs_one_poller() {
    let h = harness();
    let id = h.engine.add_connection(polled("Centre")).unwrap();

    h.engine.activate_connection(&id).unwrap();
    h.engine.activate_connection(&id).unwrap();
    tokio::time::sleep(Duration::from_millis(2500)).await;

    // Ticks at 0s, 1s and 2s.
    assert_eq!(h.backend.fetches(), 3);
}

#[tokio::test(start_paused = true)]
async fn deactivation_stops_polling() {
    let h = harness();
    let id = h.engine.add_connection(polled("Centre")).unwrap();
    h.engine.activate_connection(&id).unwrap();
    settle().await;
    h.engine.deactivate_connection(&id).unwrap();

    let before = h.backend.fetches();
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(h.backend.fetches(), before);
    assert!(!h.engine.get_connection(&id).unwrap().is_active);
    // The last payload stays readable.
    assert!(h.engine.get_live_data(&id).is_some());
}

#[tokio::test(start_paused = true)]
async fn in_flight_tick_is_discarded_after_deactivate() {
    let h = harness();
    let id = h.engine.add_connection(polled("Centre")).unwrap();
    let gate = h.backend.hold_fetches();

    h.engine.activate_connection(&id).unwrap();
    wait_for_fetches(&h.backend, 1).await;

    h.engine.deactivate_connection(&id).unwrap();
    gate.notify_one();
    settle().await;

    assert!(h.engine.get_live_data(&id).is_none());
    let conn = h.engine.get_connection(&id).unwrap();
    assert!(conn.last_updated_at.is_none());
    assert!(conn.last_error.is_none());
}

#[tokio::test(start_paused = true)]
async fn in_flight_tick_is_discarded_after_remove() {
    let h = harness();
    let id = h.engine.add_connection(polled("Centre")).unwrap();
    let gate = h.backend.hold_fetches();

    h.engine.activate_connection(&id).unwrap();
    wait_for_fetches(&h.backend, 1).await;

    h.engine.remove_connection(&id).unwrap();
    gate.notify_one();
    settle().await;

    assert!(h.engine.get_live_data(&id).is_none());
    assert!(h.engine.get_connection(&id).is_none());
}

#[tokio::test(start_paused = true)]
async fn failure_keeps_last_payload() {
    let h = harness();
    let id = h.engine.add_connection(polled("Centre")).unwrap();
    h.engine.activate_connection(&id).unwrap();
    settle().await;
    let first = h.engine.get_live_data(&id).unwrap();

    h.backend.fail.store(true, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(1)).await;

    let conn = h.engine.get_connection(&id).unwrap();
    assert_eq!(conn.last_error.as_deref(), Some("Fetch failed: upstream down"));
    assert_eq!(h.engine.get_live_data(&id).unwrap(), first);

    h.backend.fail.store(false, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(1)).await;

    let conn = h.engine.get_connection(&id).unwrap();
    assert!(conn.last_error.is_none());
    assert_ne!(h.engine.get_live_data(&id).unwrap(), first);
}

#[tokio::test(start_paused = true)]
async fn one_failing_connection_does_not_affect_another() {
    let h = harness();
    let bad = h
        .engine
        .add_connection(ConnectionDraft::new("Feed", ProviderKind::StreamedFeed).court("Nowhere"))
        .unwrap();
    let good = h
        .engine
        .add_connection(ConnectionDraft::new("Sim", ProviderKind::Simulated))
        .unwrap();

    h.engine.activate_connection(&bad).unwrap();
    h.engine.activate_connection(&good).unwrap();
    settle().await;

    assert!(h.engine.get_connection(&bad).unwrap().last_error.is_some());
    assert!(h.engine.get_live_data(&bad).is_none());
    assert!(h.engine.get_live_data(&good).is_some());
}

#[tokio::test(start_paused = true)]
async fn updating_active_connection_keeps_it_polling() {
    let h = harness();
    let id = h.engine.add_connection(polled("Centre")).unwrap();
    h.engine.activate_connection(&id).unwrap();
    settle().await;

    let updated = h
        .engine
        .update_connection(
            &id,
            ConnectionPatch {
                poll_interval_secs: Some(2),
                ..ConnectionPatch::default()
            },
        )
        .unwrap();
    assert_eq!(updated.poll_interval_secs, 2);

    let before = h.backend.fetches();
    tokio::time::sleep(Duration::from_millis(4500)).await;
    // Restart ticks immediately, then at 2s and 4s.
    assert_eq!(h.backend.fetches(), before + 3);
}

#[tokio::test]
async fn unknown_connection_is_not_found() {
    let h = harness();
    let ghost = ConnectionId::new();
    assert!(matches!(
        h.engine.activate_connection(&ghost),
        Err(CoreError::ConnectionNotFound { .. })
    ));
    assert!(matches!(
        h.engine.deactivate_connection(&ghost),
        Err(CoreError::ConnectionNotFound { .. })
    ));
    assert!(matches!(
        h.engine.remove_connection(&ghost),
        Err(CoreError::ConnectionNotFound { .. })
    ));
    assert!(matches!(
        h.engine.remove_binding("ghost"),
        Err(CoreError::BindingNotFound { .. })
    ));
}

// ── Providers ───────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn manual_console_reports_default_then_session() {
    let h = harness();
    let id = h
        .engine
        .add_connection(ConnectionDraft::new("Console", ProviderKind::ManualConsole))
        .unwrap();
    h.engine.activate_connection(&id).unwrap();
    settle().await;

    let idle = h.engine.get_live_data(&id).unwrap();
    assert_eq!(idle["matchStatus"], "no_active_match");
    assert!(idle.get("tiebreakScore").is_some());

    h.manual.set(json!({ "matchId": "console-1", "matchStatus": "in_progress" }));
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(h.engine.get_live_data(&id).unwrap()["matchId"], "console-1");
}

#[tokio::test(start_paused = true)]
async fn simulated_connection_produces_tennis_payload() {
    let h = harness();
    let id = h
        .engine
        .add_connection(ConnectionDraft::new("Sim", ProviderKind::Simulated))
        .unwrap();
    h.engine
        .add_binding(ComponentBinding::new("name", id, "player1.name"))
        .unwrap();
    h.engine.activate_connection(&id).unwrap();
    settle().await;

    assert!(h.engine.get_value("name").unwrap().is_string());
    assert_eq!(h.engine.get_live_data(&id).unwrap()["tournament"], "Simulation Open");
}

#[tokio::test(start_paused = true)]
async fn streamed_feed_scoped_and_unscoped() {
    let h = harness();
    h.backend.set_courts(&[
        ("Court 1", json!({ "matchId": "a" })),
        ("Court 2", json!({ "matchId": "b" })),
    ]);
    let scoped = h
        .engine
        .add_connection(ConnectionDraft::new("One", ProviderKind::StreamedFeed).court("Court 1"))
        .unwrap();
    let all = h
        .engine
        .add_connection(ConnectionDraft::new("All", ProviderKind::StreamedFeed))
        .unwrap();
    h.engine.activate_connection(&scoped).unwrap();
    h.engine.activate_connection(&all).unwrap();
    settle().await;

    assert_eq!(*h.engine.get_live_data(&scoped).unwrap(), json!({ "matchId": "a" }));
    let everything = h.engine.get_live_data(&all).unwrap();
    assert_eq!(everything["Court 2"]["matchId"], "b");
    assert_eq!(everything.as_object().unwrap().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn normalize_flag_folds_payload() {
    let h = harness();
    *h.backend.payload.lock().unwrap() = Some(json!({
        "id": "m-7",
        "team1": { "name": "Ana" },
        "score": { "player1_sets": 2, "player1_points": "love" },
    }));
    let id = h
        .engine
        .add_connection(polled("Centre").normalize(true))
        .unwrap();
    h.engine.activate_connection(&id).unwrap();
    settle().await;

    let state = h.engine.get_live_data(&id).unwrap();
    assert_eq!(state["matchId"], "m-7");
    assert_eq!(state["player1"]["name"], "Ana");
    assert_eq!(state["player2"]["name"], "Player 2");
    assert_eq!(state["score"]["player1Sets"], 2);
    assert_eq!(state["score"]["player1Points"], "0");
    assert_eq!(state["matchStatus"], "in_progress");
}

#[tokio::test(start_paused = true)]
async fn normalize_rejects_payload_without_match() {
    let h = harness();
    let id = h
        .engine
        .add_connection(polled("Centre").normalize(true))
        .unwrap();
    h.engine.activate_connection(&id).unwrap();
    settle().await;

    assert!(h.engine.get_live_data(&id).is_none());
    let conn = h.engine.get_connection(&id).unwrap();
    assert!(conn.last_error.unwrap().contains("no match id"));
}

// ── Bindings ────────────────────────────────────────────────────────

#[tokio::test]
async fn removing_connection_cascades_bindings() {
    let h = harness();
    let a = h.engine.add_connection(polled("A")).unwrap();
    let b = h.engine.add_connection(polled("B")).unwrap();
    h.engine
        .add_binding(ComponentBinding::new("a1", a, "x"))
        .unwrap();
    h.engine
        .add_binding(ComponentBinding::new("a2", a, "y"))
        .unwrap();
    h.engine
        .add_binding(ComponentBinding::new("b1", b, "x"))
        .unwrap();

    h.engine.remove_connection(&a).unwrap();

    let remaining: Vec<String> = h
        .engine
        .bindings()
        .into_iter()
        .map(|b| b.component_id)
        .collect();
    assert_eq!(remaining, vec!["b1"]);
    assert!(h.engine.get_binding("a1").is_none());
}

// ── Staleness ───────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn staleness_lifecycle() {
    let h = harness();
    assert!(h.engine.is_stale(5));

    let id = h.engine.add_connection(polled("Centre")).unwrap();
    h.engine.activate_connection(&id).unwrap();
    settle().await;
    h.engine.deactivate_connection(&id).unwrap();

    let written = h.engine.last_write().unwrap();
    assert!(!h.engine.is_stale_at(written + TimeDelta::minutes(5), 5));
    assert!(h.engine.is_stale_at(written + TimeDelta::seconds(301), 5));
}

// ── Court sync ──────────────────────────────────────────────────────

#[tokio::test]
async fn sync_scopes_cache_to_displayed_courts() {
    let h = harness();
    h.backend.set_courts(&[
        ("Court 1", json!({ "matchId": "a" })),
        ("Court 2", json!({ "matchId": "b" })),
    ]);

    // Nothing scoped yet: the recency fallback fills the cache.
    h.engine.sync_now().await.unwrap();
    assert_eq!(h.engine.available_courts(), vec!["Court 1", "Court 2"]);
    let first_stamp = h.engine.court_data("Court 1").unwrap().last_updated_at;

    h.displays.replace(vec![
        DisplayInstance::new("main", Some("Court 1".into())),
        DisplayInstance::new("side", Some("Court 1".into())),
    ]);
    let before = Utc::now();
    let report = h.engine.sync_now().await.unwrap();

    assert_eq!(report.working_set, vec!["Court 1"]);
    assert_eq!(report.evicted, vec!["Court 2"]);
    assert_eq!(h.engine.available_courts(), vec!["Court 1"]);
    let entry = h.engine.court_data("Court 1").unwrap();
    assert!(entry.last_updated_at >= before);
    assert!(entry.last_updated_at >= first_stamp);
    assert_eq!(
        h.backend.court_calls.lock().unwrap().last().unwrap(),
        &vec!["Court 1".to_owned()]
    );
}

#[tokio::test]
async fn unscoped_sync_uses_recent_feed_without_eviction() {
    let h = harness();
    h.backend.set_courts(&[
        ("Court 1", json!({})),
        ("Court 2", json!({})),
        ("Court 3", json!({})),
    ]);
    h.displays
        .replace(vec![DisplayInstance::new("main", None)]);

    let report = h.engine.sync_now().await.unwrap();

    assert!(report.working_set.is_empty());
    assert!(report.evicted.is_empty());
    assert_eq!(report.fetched, 3);
    assert_eq!(h.backend.recent_calls.load(Ordering::SeqCst), 1);
    assert!(h.backend.court_calls.lock().unwrap().is_empty());
    assert_eq!(h.engine.available_courts().len(), 3);

    let status = h.engine.sync_status();
    assert_eq!(status.stored_courts, 3);
    assert!(status.last_sync.is_some());
    assert_eq!(status.error_count, 0);
}

#[tokio::test(start_paused = true)]
async fn sync_task_start_and_stop() {
    let h = harness();
    h.backend.set_courts(&[("Court 1", json!({}))]);

    h.engine.start_sync(None).unwrap();
    assert!(matches!(
        h.engine.start_sync(None),
        Err(CoreError::SyncAlreadyRunning)
    ));
    tokio::time::sleep(Duration::from_millis(4500)).await;

    let status = h.engine.sync_status();
    assert!(status.is_running);
    assert_eq!(status.interval_ms, 2000);
    // Ticks at 0s, 2s and 4s.
    assert_eq!(h.backend.recent_calls.load(Ordering::SeqCst), 3);

    h.engine.stop_sync().unwrap();
    assert!(matches!(h.engine.stop_sync(), Err(CoreError::SyncNotRunning)));
    settle().await;
    assert!(!h.engine.sync_status().is_running);
}

// ── Persistence ─────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn bursts_of_edits_coalesce_into_one_save() {
    let h = harness();
    h.engine.start().await.unwrap();

    for name in ["A", "B", "C"] {
        h.engine.add_connection(polled(name)).unwrap();
    }
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(h.state.saves.load(Ordering::SeqCst), 0);

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(h.state.saves.load(Ordering::SeqCst), 1);
    let saved = h.state.saved.lock().unwrap().clone().unwrap();
    assert_eq!(saved.connections.len(), 3);

    h.engine.add_connection(polled("D")).unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(h.state.saves.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn save_failure_does_not_block_edits() {
    let h = harness();
    h.state.fail.store(true, Ordering::SeqCst);

    let id = h.engine.add_connection(polled("A")).unwrap();
    assert!(h.engine.flush().await.is_err());
    assert!(h.engine.persistence_error().unwrap().contains("disk full"));
    assert!(h.engine.get_connection(&id).is_some());
    assert!(h.engine.has_pending_changes());

    h.state.fail.store(false, Ordering::SeqCst);
    assert!(h.engine.flush().await.unwrap());
    assert!(h.engine.persistence_error().is_none());
}

#[tokio::test]
async fn state_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    let open = |backend: Arc<FakeBackend>| {
        Engine::new(
            EngineConfig::default(),
            Collaborators {
                backend,
                displays: Arc::new(StaticDisplays::default()),
                manual: Arc::new(SharedManualScore::new()),
                state: Arc::new(JsonFileStore::new(path.clone())),
            },
        )
    };

    let first = open(Arc::new(FakeBackend::default()));
    first.start().await.unwrap();
    let centre = first.add_connection(polled("Centre")).unwrap();
    let sim = first
        .add_connection(ConnectionDraft::new("Sim", ProviderKind::Simulated))
        .unwrap();
    first
        .add_binding(ComponentBinding::new("sets", centre, "score.player1Sets"))
        .unwrap();
    first.activate_connection(&centre).unwrap();
    first.shutdown().await;

    let backend = Arc::new(FakeBackend::default());
    let second = open(backend.clone());
    second.start().await.unwrap();

    let names: Vec<(ConnectionId, String, bool)> = second
        .connections()
        .into_iter()
        .map(|c| (c.id, c.name, c.is_active))
        .collect();
    assert_eq!(
        names,
        vec![
            (centre, "Centre".to_owned(), true),
            (sim, "Sim".to_owned(), false),
        ]
    );
    assert_eq!(second.bindings(), first.bindings());

    // The connection saved as active resumes polling.
    wait_for_fetches(&backend, 1).await;
    second.shutdown().await;
}

#[tokio::test]
async fn unreadable_state_is_reported_on_start() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(&path, "not json").unwrap();

    let engine = Engine::new(
        EngineConfig::default(),
        Collaborators {
            backend: Arc::new(FakeBackend::default()),
            displays: Arc::new(StaticDisplays::default()),
            manual: Arc::new(SharedManualScore::new()),
            state: Arc::new(JsonFileStore::new(path.clone())),
        },
    );

    assert!(matches!(engine.start().await, Err(CoreError::Persistence { .. })));
    assert!(engine.persistence_error().is_some());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "not json");
}

#[tokio::test]
async fn edits_after_failed_load_never_overwrite_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(&path, "not json").unwrap();

    let engine = Engine::new(
        EngineConfig::default(),
        Collaborators {
            backend: Arc::new(FakeBackend::default()),
            displays: Arc::new(StaticDisplays::default()),
            manual: Arc::new(SharedManualScore::new()),
            state: Arc::new(JsonFileStore::new(path.clone())),
        },
    );

    assert!(engine.start().await.is_err());
    engine.add_connection(polled("X")).unwrap();
    assert!(matches!(engine.flush().await, Err(CoreError::Persistence { .. })));
    engine.shutdown().await;

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "not json");
    assert!(engine.has_pending_changes());
    assert!(engine.persistence_error().is_some());
}

// ── Probing ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_connection_by_provider() {
    let h = harness();
    let api = h.engine.add_connection(polled("Centre")).unwrap();
    let sim = h
        .engine
        .add_connection(ConnectionDraft::new("Sim", ProviderKind::Simulated))
        .unwrap();

    assert!(h.engine.test_connection(&api).await.unwrap());
    assert!(h.engine.test_connection(&sim).await.unwrap());
    h.backend.fail.store(true, Ordering::SeqCst);
    assert!(!h.engine.test_connection(&api).await.unwrap());

    assert!(h.engine.list_matches(&api).await.unwrap().is_empty());
    assert!(matches!(
        h.engine.list_matches(&sim).await,
        Err(CoreError::Validation { .. })
    ));
}
