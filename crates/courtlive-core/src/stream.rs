// ── Court subscriptions ──
//
// Subscription handle over the court tier of the data store.

use std::sync::Arc;

use tokio::sync::watch;

use crate::store::CourtEntry;

type Snapshot = Arc<Vec<Arc<CourtEntry>>>;

/// A subscription to the court cache.
///
/// Provides point-in-time snapshot access and change notification via
/// [`changed()`](Self::changed).
pub struct CourtStream {
    current: Snapshot,
    receiver: watch::Receiver<Snapshot>,
}

impl CourtStream {
    pub(crate) fn new(receiver: watch::Receiver<Snapshot>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// The snapshot captured at creation time or at the last `changed()`.
    pub fn current(&self) -> &Snapshot {
        &self.current
    }

    /// The latest snapshot (may have changed since creation).
    pub fn latest(&self) -> Snapshot {
        self.receiver.borrow().clone()
    }

    /// Wait for the next change, returning the new snapshot.
    /// Returns `None` once the store has been dropped.
    pub async fn changed(&mut self) -> Option<Snapshot> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }
}
