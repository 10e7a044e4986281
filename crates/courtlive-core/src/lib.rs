//! Live match data engine behind courtlive overlays.
//!
//! This crate owns the runtime that keeps on-screen graphics in step with
//! matches in progress:
//!
//! - **[`Engine`]**: Facade owning the connection registry, one polling
//!   task per active connection, the debounced persistence flusher, and the
//!   display-scoped court sync task. Construct it with [`Engine::new`], call
//!   [`Engine::start`] to load saved state and resume pollers, and
//!   [`Engine::shutdown`] to stop everything and flush.
//!
//! - **[`DataStore`]**: Two-tier cache: the latest payload per connection,
//!   and the latest payload per court name. Reads hand out `Arc`s; every
//!   write replaces a whole entry.
//!
//! - **[`resolve_path`]**: Dot-path lookup into a match payload. Misses are
//!   `None`, never errors.
//!
//! - **Collaborator traits** ([`backend`], [`persist`]): the fetch backend,
//!   the display-instance source, the manual scoring session, and the durable
//!   state store, each with a shipped implementation.
//!
//! - **Domain model** ([`model`]): connections, component bindings, display
//!   instances, and the canonical tennis match shape.

pub mod backend;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod persist;
pub mod provider;
pub mod registry;
pub mod resolve;
pub mod store;
pub mod stream;
pub mod sync;

mod poller;

// ── Primary re-exports ──────────────────────────────────────────────
pub use backend::{
    DisplaySource, HttpBackend, ManualScoreSource, MatchBackend, SharedManualScore,
    StaticDisplays,
};
pub use config::{BackoffPolicy, EngineConfig};
pub use engine::{Collaborators, Engine};
pub use error::CoreError;
pub use persist::{ConnectionRecord, JsonFileStore, PersistedState, StateStore};
pub use registry::Registry;
pub use resolve::resolve_path;
pub use store::{CourtEntry, DataStore};
pub use stream::CourtStream;
pub use sync::{CourtSyncStatus, SyncReport};

pub use model::{
    BindingPatch, ComponentBinding, Connection, ConnectionDraft, ConnectionId, ConnectionPatch,
    DisplayInstance, MatchState, ProviderKind,
};

pub use courtlive_api::{CourtMap, MatchInfo};
