// ── Per-connection polling ──
//
// One task per active connection. The task awaits each fetch before
// waiting for the next tick, so ticks of one connection never overlap.
// Results are committed under the connection's registry entry and only
// while the connection is still active and the task's token is live:
// a fetch that was in flight when the connection was deactivated or
// removed is discarded.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::BackoffPolicy;
use crate::error::CoreError;
use crate::model::{ConnectionId, MatchState};
use crate::provider::{Provider, ProviderSources};
use crate::registry::Registry;
use crate::store::DataStore;

/// Shared state every poller reads from.
pub(crate) struct PollContext {
    pub(crate) registry: Arc<Registry>,
    pub(crate) store: Arc<DataStore>,
    pub(crate) sources: Arc<ProviderSources>,
    pub(crate) backoff: BackoffPolicy,
}

/// A running poller.
pub(crate) struct PollerHandle {
    pub(crate) cancel: CancellationToken,
    pub(crate) task: JoinHandle<()>,
}

impl PollerHandle {
    pub(crate) fn is_live(&self) -> bool {
        !self.cancel.is_cancelled() && !self.task.is_finished()
    }

    /// Cancel the task. A fetch in flight finishes but is not committed.
    pub(crate) fn stop(&self) {
        self.cancel.cancel();
    }
}

pub(crate) fn spawn(
    ctx: Arc<PollContext>,
    id: ConnectionId,
    cancel: CancellationToken,
) -> PollerHandle {
    let task = tokio::spawn(poll_task(ctx, id, cancel.clone()));
    PollerHandle { cancel, task }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Commit {
    Stored,
    Failed,
    Dropped,
}

async fn poll_task(ctx: Arc<PollContext>, id: ConnectionId, cancel: CancellationToken) {
    let Some(conn) = ctx.registry.connection(&id) else {
        return;
    };
    let period = Duration::from_secs(conn.poll_interval_secs.max(1));
    info!(connection = %id, name = %conn.name, provider = %conn.provider, ?period, "poller started");

    // The first tick fires immediately so activation shows data at once.
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut failures: u32 = 0;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {}
        }

        let result = fetch_once(&ctx, &id).await;
        match commit(&ctx, &id, &cancel, result) {
            Commit::Stored => failures = 0,
            Commit::Failed => failures = failures.saturating_add(1),
            Commit::Dropped => break,
        }

        if let Some(delay) = ctx.backoff.delay(failures) {
            debug!(connection = %id, failures, ?delay, "backing off");
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(delay) => {}
            }
            interval.reset();
        }
    }

    debug!(connection = %id, "poller stopped");
}

/// Fetch using the connection's current configuration.
async fn fetch_once(ctx: &PollContext, id: &ConnectionId) -> Result<MatchState, CoreError> {
    let conn = ctx
        .registry
        .connection(id)
        .ok_or(CoreError::ConnectionNotFound { id: *id })?;
    let now = Utc::now();
    let provider = Provider::for_connection(&conn, now)?;
    debug!(connection = %id, provider = %conn.provider, "polling");
    provider.fetch(&ctx.sources, now).await
}

fn commit(
    ctx: &PollContext,
    id: &ConnectionId,
    cancel: &CancellationToken,
    result: Result<MatchState, CoreError>,
) -> Commit {
    let Some(mut conn) = ctx.registry.connections.get_mut(id) else {
        debug!(connection = %id, "connection removed, discarding result");
        return Commit::Dropped;
    };
    if cancel.is_cancelled() || !conn.is_active {
        debug!(connection = %id, "connection deactivated, discarding result");
        return Commit::Dropped;
    }

    let now = Utc::now();
    match result {
        Ok(payload) => {
            ctx.store.put_live(*id, payload, now);
            conn.last_updated_at = Some(now);
            conn.last_error = None;
            Commit::Stored
        }
        Err(e) => {
            warn!(connection = %id, error = %e, "poll failed");
            conn.last_error = Some(e.to_string());
            Commit::Failed
        }
    }
}
