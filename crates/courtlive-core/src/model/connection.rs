// ── Connections ──
//
// A connection is one configured data source plus its runtime status.
// Configuration fields are persisted; status fields live only in memory.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::error::CoreError;

/// Poll cadence applied when a draft does not set one.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

// ── ConnectionId ────────────────────────────────────────────────────

/// Opaque, stable identifier of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ConnectionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

impl From<Uuid> for ConnectionId {
    fn from(u: Uuid) -> Self {
        Self(u)
    }
}

// ── ProviderKind ────────────────────────────────────────────────────

/// Where a connection's match data comes from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum ProviderKind {
    /// Deterministic synthetic tennis match.
    Simulated,
    /// Scores entered by an operator at a local scoring console.
    ManualConsole,
    /// One match fetched from a per-connection HTTP endpoint.
    PolledApi,
    /// The multi-court feed, optionally scoped to one court.
    StreamedFeed,
}

impl ProviderKind {
    pub fn requires_endpoint(self) -> bool {
        matches!(self, Self::PolledApi)
    }
}

// ── Connection ──────────────────────────────────────────────────────

/// A configured data source and its live status.
#[derive(Debug, Clone)]
pub struct Connection {
    pub id: ConnectionId,
    pub name: String,
    pub provider: ProviderKind,
    pub endpoint: Option<String>,
    pub credential: Option<SecretString>,
    /// Court name for `StreamedFeed`; unset means "all recent courts".
    pub court: Option<String>,
    /// Pass raw payloads through the tennis normalizer.
    pub normalize: bool,
    pub poll_interval_secs: u64,
    pub is_active: bool,

    // Runtime status, never persisted.
    pub activated_at: Option<DateTime<Utc>>,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl Connection {
    pub(crate) fn from_draft(id: ConnectionId, draft: ConnectionDraft) -> Self {
        Self {
            id,
            name: draft.name.trim().to_owned(),
            provider: draft.provider,
            endpoint: draft.endpoint,
            credential: draft.credential,
            court: draft.court,
            normalize: draft.normalize,
            poll_interval_secs: draft.poll_interval_secs,
            is_active: false,
            activated_at: None,
            last_updated_at: None,
            last_error: None,
        }
    }

    /// Apply a patch in place. Callers validate the result.
    pub(crate) fn apply(&mut self, patch: ConnectionPatch) {
        if let Some(name) = patch.name {
            self.name = name.trim().to_owned();
        }
        if let Some(provider) = patch.provider {
            self.provider = provider;
        }
        if let Some(endpoint) = patch.endpoint {
            self.endpoint = endpoint;
        }
        if let Some(credential) = patch.credential {
            self.credential = credential;
        }
        if let Some(court) = patch.court {
            self.court = court;
        }
        if let Some(normalize) = patch.normalize {
            self.normalize = normalize;
        }
        if let Some(secs) = patch.poll_interval_secs {
            self.poll_interval_secs = secs;
        }
    }

    pub(crate) fn validate(&self) -> Result<(), CoreError> {
        validate_fields(
            &self.name,
            self.provider,
            self.endpoint.as_deref(),
            self.poll_interval_secs,
        )
    }
}

fn validate_fields(
    name: &str,
    provider: ProviderKind,
    endpoint: Option<&str>,
    poll_interval_secs: u64,
) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::validation("name", "must not be empty"));
    }
    if poll_interval_secs == 0 {
        return Err(CoreError::validation(
            "poll_interval_secs",
            "must be at least 1 second",
        ));
    }
    match endpoint {
        Some(raw) => {
            let url = url::Url::parse(raw)
                .map_err(|e| CoreError::validation("endpoint", e.to_string()))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(CoreError::validation(
                    "endpoint",
                    format!("unsupported scheme '{}'", url.scheme()),
                ));
            }
        }
        None if provider.requires_endpoint() => {
            return Err(CoreError::validation(
                "endpoint",
                format!("required for {provider} connections"),
            ));
        }
        None => {}
    }
    Ok(())
}

// ── Drafts and patches ──────────────────────────────────────────────

/// Everything needed to create a connection.
#[derive(Debug, Clone)]
pub struct ConnectionDraft {
    pub name: String,
    pub provider: ProviderKind,
    pub endpoint: Option<String>,
    pub credential: Option<SecretString>,
    pub court: Option<String>,
    pub normalize: bool,
    pub poll_interval_secs: u64,
}

impl ConnectionDraft {
    pub fn new(name: impl Into<String>, provider: ProviderKind) -> Self {
        Self {
            name: name.into(),
            provider,
            endpoint: None,
            credential: None,
            court: None,
            normalize: false,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
        }
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn credential(mut self, credential: SecretString) -> Self {
        self.credential = Some(credential);
        self
    }

    pub fn court(mut self, court: impl Into<String>) -> Self {
        self.court = Some(court.into());
        self
    }

    pub fn normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn poll_interval_secs(mut self, secs: u64) -> Self {
        self.poll_interval_secs = secs;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), CoreError> {
        validate_fields(
            &self.name,
            self.provider,
            self.endpoint.as_deref(),
            self.poll_interval_secs,
        )
    }
}

/// A partial edit. `None` leaves a field untouched; for optional fields
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct ConnectionPatch {
    pub name: Option<String>,
    pub provider: Option<ProviderKind>,
    pub endpoint: Option<Option<String>>,
    pub credential: Option<Option<SecretString>>,
    pub court: Option<Option<String>>,
    pub normalize: Option<bool>,
    pub poll_interval_secs: Option<u64>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn provider_kind_parses_kebab_case() {
        assert_eq!(
            "polled-api".parse::<ProviderKind>().ok(),
            Some(ProviderKind::PolledApi)
        );
        assert_eq!(
            "Streamed-Feed".parse::<ProviderKind>().ok(),
            Some(ProviderKind::StreamedFeed)
        );
        assert_eq!(ProviderKind::ManualConsole.to_string(), "manual-console");
    }

    #[test]
    fn polled_api_requires_endpoint() {
        let draft = ConnectionDraft::new("Centre", ProviderKind::PolledApi);
        let err = draft.validate().unwrap_err();
        assert!(matches!(err, CoreError::Validation { ref field, .. } if field == "endpoint"));

        let draft = draft.endpoint("https://scores.example.com/match/1");
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn rejects_zero_interval_and_blank_name() {
        let draft = ConnectionDraft::new("  ", ProviderKind::Simulated);
        assert!(draft.validate().is_err());

        let draft = ConnectionDraft::new("Sim", ProviderKind::Simulated).poll_interval_secs(0);
        assert!(draft.validate().is_err());
    }

    #[test]
    fn rejects_non_http_endpoint() {
        let draft =
            ConnectionDraft::new("Feed", ProviderKind::PolledApi).endpoint("ftp://example.com/x");
        assert!(draft.validate().is_err());
    }

    #[test]
    fn patch_clears_optional_fields() {
        let draft = ConnectionDraft::new("Feed", ProviderKind::StreamedFeed).court("Court 1");
        let mut conn = Connection::from_draft(ConnectionId::new(), draft);
        conn.apply(ConnectionPatch {
            court: Some(None),
            poll_interval_secs: Some(2),
            ..ConnectionPatch::default()
        });
        assert_eq!(conn.court, None);
        assert_eq!(conn.poll_interval_secs, 2);
    }

    #[test]
    fn connection_id_round_trips_through_display() {
        let id = ConnectionId::new();
        assert_eq!(id.to_string().parse::<ConnectionId>().ok(), Some(id));
    }
}
