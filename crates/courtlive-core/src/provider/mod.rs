// ── Providers ──
//
// One fetch strategy per `ProviderKind`. A `Provider` is built from a
// connection snapshot at every tick, so edits take effect on the next
// fetch without any extra plumbing.

pub mod manual;
pub mod remote;
pub mod simulated;

use std::sync::Arc;

use chrono::{DateTime, Utc};

pub use manual::ManualConsole;
pub use remote::{PolledApi, StreamedFeed};
pub use simulated::SimulatedMatch;

use crate::backend::{ManualScoreSource, MatchBackend};
use crate::error::CoreError;
use crate::model::{Connection, MatchState, ProviderKind};

/// Collaborators a provider may fetch from.
pub(crate) struct ProviderSources {
    pub(crate) backend: Arc<dyn MatchBackend>,
    pub(crate) manual: Arc<dyn ManualScoreSource>,
}

/// A connection's fetch strategy.
#[derive(Debug, Clone)]
pub enum Provider {
    Simulated(SimulatedMatch),
    ManualConsole(ManualConsole),
    PolledApi(PolledApi),
    StreamedFeed(StreamedFeed),
}

impl Provider {
    /// Build the strategy for `conn` as of `now`.
    pub fn for_connection(conn: &Connection, now: DateTime<Utc>) -> Result<Self, CoreError> {
        Ok(match conn.provider {
            ProviderKind::Simulated => {
                Self::Simulated(SimulatedMatch::new(conn.id, conn.activated_at.unwrap_or(now)))
            }
            ProviderKind::ManualConsole => Self::ManualConsole(ManualConsole),
            ProviderKind::PolledApi => Self::PolledApi(PolledApi::from_connection(conn)?),
            ProviderKind::StreamedFeed => Self::StreamedFeed(StreamedFeed::from_connection(conn)),
        })
    }

    pub(crate) async fn fetch(
        &self,
        sources: &ProviderSources,
        now: DateTime<Utc>,
    ) -> Result<MatchState, CoreError> {
        match self {
            Self::Simulated(sim) => Ok(sim.snapshot_at(now)),
            Self::ManualConsole(console) => Ok(console.fetch(sources.manual.as_ref()).await),
            Self::PolledApi(api) => api.fetch(sources.backend.as_ref()).await,
            Self::StreamedFeed(feed) => feed.fetch(sources.backend.as_ref()).await,
        }
    }
}
