// ── Display-scoped court sync ──
//
// Keeps the court cache limited to what is on screen. Each pass reads the
// active displays, fetches only the courts they filter on (or every
// recently updated court when none is scoped), merges the result, and
// evicts courts no display shows any more.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backend::{DisplaySource, MatchBackend};
use crate::error::CoreError;
use crate::model::DisplayInstance;
use crate::store::DataStore;

/// Snapshot of the coordinator for status displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourtSyncStatus {
    pub is_running: bool,
    pub interval_ms: u64,
    pub last_sync: Option<DateTime<Utc>>,
    pub active_courts: Vec<String>,
    pub stored_courts: usize,
    pub error_count: u64,
}

/// Outcome of one sync pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    /// Courts the displays asked for; empty means the recency fallback ran.
    pub working_set: Vec<String>,
    pub fetched: usize,
    /// Courts dropped because no display shows them.
    pub evicted: Vec<String>,
    /// Courts dropped because they were not refreshed in time.
    pub expired: Vec<String>,
}

/// Distinct court filters of the active displays, trimmed, in first-seen
/// order.
pub fn working_set(displays: &[DisplayInstance]) -> Vec<String> {
    let mut courts: Vec<String> = Vec::new();
    for court in displays
        .iter()
        .filter(|d| d.is_active)
        .filter_map(|d| d.court_filter.as_deref())
        .map(str::trim)
        .filter(|c| !c.is_empty())
    {
        if !courts.iter().any(|c| c == court) {
            courts.push(court.to_owned());
        }
    }
    courts
}

struct SyncState {
    task: Option<(CancellationToken, JoinHandle<()>)>,
    interval: Duration,
    last_sync: Option<DateTime<Utc>>,
    active_courts: Vec<String>,
}

pub(crate) struct SyncCoordinator {
    store: Arc<DataStore>,
    backend: Arc<dyn MatchBackend>,
    displays: Arc<dyn DisplaySource>,
    court_max_age: Option<Duration>,
    state: Mutex<SyncState>,
    error_count: AtomicU64,
}

impl SyncCoordinator {
    pub(crate) fn new(
        store: Arc<DataStore>,
        backend: Arc<dyn MatchBackend>,
        displays: Arc<dyn DisplaySource>,
        interval: Duration,
        court_max_age: Option<Duration>,
    ) -> Self {
        Self {
            store,
            backend,
            displays,
            court_max_age,
            state: Mutex::new(SyncState {
                task: None,
                interval,
                last_sync: None,
                active_courts: Vec::new(),
            }),
            error_count: AtomicU64::new(0),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, SyncState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run one pass now.
    pub(crate) async fn sync_once(&self) -> Result<SyncReport, CoreError> {
        let displays = match self.displays.active_displays().await {
            Ok(displays) => displays,
            Err(e) => {
                self.error_count.fetch_add(1, Ordering::Relaxed);
                warn!(error = %e, "cannot read display instances");
                return Err(e);
            }
        };
        let wanted = working_set(&displays);

        let fetched = if wanted.is_empty() {
            self.backend.fetch_recent().await
        } else {
            self.backend.fetch_courts(&wanted).await
        };
        let courts = match fetched {
            Ok(courts) => courts,
            Err(e) => {
                self.error_count.fetch_add(1, Ordering::Relaxed);
                warn!(error = %e, courts = ?wanted, "court sync fetch failed");
                return Err(e);
            }
        };

        let now = Utc::now();
        let fetched = self.store.merge_courts(courts, now);
        let evicted = if wanted.is_empty() {
            Vec::new()
        } else {
            self.store.retain_courts(&wanted)
        };
        let expired = self
            .court_max_age
            .and_then(|age| TimeDelta::from_std(age).ok())
            .map(|age| self.store.expire_courts(now, age))
            .unwrap_or_default();

        if !evicted.is_empty() || !expired.is_empty() {
            debug!(?evicted, ?expired, "pruned court cache");
        }

        {
            let mut state = self.state();
            state.last_sync = Some(now);
            state.active_courts.clone_from(&wanted);
        }

        Ok(SyncReport {
            working_set: wanted,
            fetched,
            evicted,
            expired,
        })
    }

    /// Start the periodic task. `interval` overrides the configured cadence.
    pub(crate) fn start(
        self: &Arc<Self>,
        interval: Option<Duration>,
        parent: &CancellationToken,
    ) -> Result<(), CoreError> {
        let mut state = self.state();
        if state
            .task
            .as_ref()
            .is_some_and(|(cancel, task)| !cancel.is_cancelled() && !task.is_finished())
        {
            return Err(CoreError::SyncAlreadyRunning);
        }
        if let Some(interval) = interval {
            if interval.is_zero() {
                return Err(CoreError::validation("interval", "must be greater than zero"));
            }
            state.interval = interval;
        }

        let cancel = parent.child_token();
        let task = tokio::spawn(sync_task(Arc::clone(self), state.interval, cancel.clone()));
        info!(interval = ?state.interval, "court sync started");
        state.task = Some((cancel, task));
        Ok(())
    }

    pub(crate) fn stop(&self) -> Result<(), CoreError> {
        let (cancel, task) = self.state().task.take().ok_or(CoreError::SyncNotRunning)?;
        if cancel.is_cancelled() || task.is_finished() {
            return Err(CoreError::SyncNotRunning);
        }
        cancel.cancel();
        info!("court sync stopped");
        Ok(())
    }

    pub(crate) fn status(&self) -> CourtSyncStatus {
        let state = self.state();
        CourtSyncStatus {
            is_running: state
                .task
                .as_ref()
                .is_some_and(|(cancel, task)| !cancel.is_cancelled() && !task.is_finished()),
            interval_ms: u64::try_from(state.interval.as_millis()).unwrap_or(u64::MAX),
            last_sync: state.last_sync,
            active_courts: state.active_courts.clone(),
            stored_courts: self.store.court_count(),
            error_count: self.error_count.load(Ordering::Relaxed),
        }
    }
}

async fn sync_task(coordinator: Arc<SyncCoordinator>, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                // Failures are counted and logged inside the pass.
                let _ = coordinator.sync_once().await;
            }
        }
    }

    debug!("court sync task exited");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn display(id: &str, active: bool, court: Option<&str>) -> DisplayInstance {
        DisplayInstance {
            id: id.into(),
            is_active: active,
            court_filter: court.map(str::to_owned),
        }
    }

    #[test]
    fn working_set_dedupes_and_skips_inactive() {
        let displays = vec![
            display("a", true, Some("Court 1")),
            display("b", true, Some(" Court 1 ")),
            display("c", false, Some("Court 9")),
            display("d", true, Some("   ")),
            display("e", true, None),
            display("f", true, Some("Court 2")),
        ];
        assert_eq!(working_set(&displays), vec!["Court 1", "Court 2"]);
    }

    #[test]
    fn working_set_empty_without_filters() {
        let displays = vec![display("a", true, None)];
        assert!(working_set(&displays).is_empty());
    }
}
