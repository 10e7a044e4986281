// ── Keyed reactive collection ──
//
// Sharded concurrent storage with O(1) lookups and push-based change
// notification via a `watch` channel carrying a full snapshot.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;

/// A concurrent map from string keys to shared entries.
///
/// Every mutation rebuilds the snapshot that subscribers receive. The
/// snapshot is ordered by key so consumers render in a stable order.
pub(crate) struct Collection<T: Send + Sync + 'static> {
    by_key: DashMap<String, Arc<T>>,
    snapshot: watch::Sender<Arc<Vec<Arc<T>>>>,
}

impl<T: Send + Sync + 'static> Collection<T> {
    pub(crate) fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            by_key: DashMap::new(),
            snapshot,
        }
    }

    /// Insert or replace every entry in `entries`, rebuilding the snapshot
    /// once. Returns the number of entries written.
    pub(crate) fn upsert_many(&self, entries: impl IntoIterator<Item = (String, T)>) -> usize {
        let mut written = 0;
        for (key, entry) in entries {
            self.by_key.insert(key, Arc::new(entry));
            written += 1;
        }
        if written > 0 {
            self.rebuild_snapshot();
        }
        written
    }

    /// Keep only entries for which `keep` returns `true`.
    /// Returns the keys that were dropped.
    pub(crate) fn retain(&self, mut keep: impl FnMut(&str, &T) -> bool) -> Vec<String> {
        let mut dropped = Vec::new();
        self.by_key.retain(|key, entry| {
            let kept = keep(key, entry);
            if !kept {
                dropped.push(key.clone());
            }
            kept
        });
        if !dropped.is_empty() {
            dropped.sort();
            self.rebuild_snapshot();
        }
        dropped
    }

    pub(crate) fn get(&self, key: &str) -> Option<Arc<T>> {
        self.by_key.get(key).map(|r| Arc::clone(r.value()))
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<T>>>> {
        self.snapshot.subscribe()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_key.len()
    }

    /// All keys, sorted.
    pub(crate) fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.by_key.iter().map(|r| r.key().clone()).collect();
        keys.sort();
        keys
    }

    fn rebuild_snapshot(&self) {
        let mut entries: Vec<(String, Arc<T>)> = self
            .by_key
            .iter()
            .map(|r| (r.key().clone(), Arc::clone(r.value())))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        let values = entries.into_iter().map(|(_, v)| v).collect();
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
    }
}
