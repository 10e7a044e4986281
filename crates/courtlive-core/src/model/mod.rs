// ── Domain model ──
//
// Connections and bindings are owned by the registry; display instances
// come from outside and are only read. Match payloads stay loosely typed.

pub mod binding;
pub mod connection;
pub mod display;
pub mod tennis;

pub use binding::{BindingPatch, ComponentBinding};
pub use connection::{Connection, ConnectionDraft, ConnectionId, ConnectionPatch, ProviderKind};
pub use display::DisplayInstance;

/// A provider's payload for one match: arbitrary nested JSON.
///
/// Never interpreted beyond dot-path lookups and optional tennis
/// normalization.
pub type MatchState = serde_json::Value;
