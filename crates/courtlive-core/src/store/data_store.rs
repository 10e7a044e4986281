// ── Central data store ──
//
// Sharded storage for the latest payload per connection and per court.
// Writes replace whole entries; reads hand out `Arc` clones so a reader
// never observes a half-written payload.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use tokio::sync::watch;

use super::collection::Collection;
use super::courts::CourtEntry;
use crate::model::{ConnectionId, MatchState};
use crate::stream::CourtStream;

/// Two-tier cache of live match data.
///
/// The connection tier is written by pollers and cleared when a
/// connection is removed. The court tier is written by the sync
/// coordinator. The time of the last successful write to either tier is
/// published on a `watch` channel.
pub struct DataStore {
    pub(crate) live: DashMap<ConnectionId, Arc<MatchState>>,
    pub(crate) courts: Collection<CourtEntry>,
    pub(crate) last_write: watch::Sender<Option<DateTime<Utc>>>,
}

impl DataStore {
    pub fn new() -> Self {
        let (last_write, _) = watch::channel(None);
        Self {
            live: DashMap::new(),
            courts: Collection::new(),
            last_write,
        }
    }

    // ── Connection tier ──────────────────────────────────────────────

    /// Latest payload committed for a connection.
    pub fn live(&self, id: &ConnectionId) -> Option<Arc<MatchState>> {
        self.live.get(id).map(|r| Arc::clone(r.value()))
    }

    pub(crate) fn put_live(&self, id: ConnectionId, payload: MatchState, now: DateTime<Utc>) {
        self.live.insert(id, Arc::new(payload));
        self.mark_written(now);
    }

    pub(crate) fn clear_live(&self, id: &ConnectionId) -> bool {
        self.live.remove(id).is_some()
    }

    pub(crate) fn clear_all_live(&self) {
        self.live.clear();
    }

    // ── Court tier ───────────────────────────────────────────────────

    pub fn court(&self, name: &str) -> Option<Arc<CourtEntry>> {
        self.courts.get(name)
    }

    /// Cached court names, sorted.
    pub fn court_names(&self) -> Vec<String> {
        self.courts.keys()
    }

    pub fn court_count(&self) -> usize {
        self.courts.len()
    }

    pub fn subscribe_courts(&self) -> CourtStream {
        CourtStream::new(self.courts.subscribe())
    }

    // ── Staleness ────────────────────────────────────────────────────

    /// Time of the last successful write to either tier.
    pub fn last_write(&self) -> Option<DateTime<Utc>> {
        *self.last_write.borrow()
    }

    /// `true` when nothing was ever written or the last write is older
    /// than `max_age`.
    pub fn is_stale(&self, max_age: TimeDelta) -> bool {
        self.is_stale_at(Utc::now(), max_age)
    }

    pub fn is_stale_at(&self, now: DateTime<Utc>, max_age: TimeDelta) -> bool {
        match self.last_write() {
            Some(at) => now.signed_duration_since(at) > max_age,
            None => true,
        }
    }

    pub(crate) fn mark_written(&self, now: DateTime<Utc>) {
        self.last_write.send_modify(|last| {
            // Writes can land slightly out of order across tasks.
            if last.is_none_or(|prev| prev < now) {
                *last = Some(now);
            }
        });
    }
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}
