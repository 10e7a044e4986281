// ── External collaborators ──
//
// Traits for everything the engine consumes but does not own: the fetch
// backend, the source of display instances, and the manual scoring
// session. Each ships with one implementation used by the CLI and tests
// can substitute their own.

use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use courtlive_api::{CourtMap, LiveClient, MatchInfo};
use secrecy::SecretString;

use crate::error::CoreError;
use crate::model::{DisplayInstance, MatchState};

/// Recency window used by [`HttpBackend::fetch_recent`] unless overridden.
pub const DEFAULT_RECENT_WINDOW_MINUTES: u32 = 5;

// ── Traits ──────────────────────────────────────────────────────────

/// Native fetch backend for remote match data.
#[async_trait]
pub trait MatchBackend: Send + Sync {
    /// Fetch one match from a per-connection endpoint.
    async fn fetch_one(
        &self,
        endpoint: &str,
        credential: Option<&SecretString>,
    ) -> Result<MatchState, CoreError>;

    /// Fetch the latest payload for each named court.
    async fn fetch_courts(&self, courts: &[String]) -> Result<CourtMap, CoreError>;

    /// Fetch every court updated within the backend's recency window.
    async fn fetch_recent(&self) -> Result<CourtMap, CoreError>;

    /// Check that an endpoint is reachable and accepts the credential.
    async fn probe(
        &self,
        endpoint: &str,
        credential: Option<&SecretString>,
    ) -> Result<bool, CoreError>;

    /// List the matches an endpoint knows about.
    async fn list_matches(
        &self,
        endpoint: &str,
        credential: Option<&SecretString>,
    ) -> Result<Vec<MatchInfo>, CoreError>;
}

/// Source of the currently configured display windows.
#[async_trait]
pub trait DisplaySource: Send + Sync {
    async fn active_displays(&self) -> Result<Vec<DisplayInstance>, CoreError>;
}

/// The operator-driven scoring session.
#[async_trait]
pub trait ManualScoreSource: Send + Sync {
    /// Current match, or `None` when no match is being scored.
    async fn current_match(&self) -> Option<MatchState>;
}

// ── HttpBackend ─────────────────────────────────────────────────────

/// [`MatchBackend`] over the live-score HTTP service.
pub struct HttpBackend {
    client: LiveClient,
    recent_window_minutes: u32,
}

impl HttpBackend {
    pub fn new(client: LiveClient) -> Self {
        Self {
            client,
            recent_window_minutes: DEFAULT_RECENT_WINDOW_MINUTES,
        }
    }

    pub fn with_recent_window(mut self, minutes: u32) -> Self {
        self.recent_window_minutes = minutes;
        self
    }
}

#[async_trait]
impl MatchBackend for HttpBackend {
    async fn fetch_one(
        &self,
        endpoint: &str,
        credential: Option<&SecretString>,
    ) -> Result<MatchState, CoreError> {
        Ok(self.client.fetch_match(endpoint, credential).await?)
    }

    async fn fetch_courts(&self, courts: &[String]) -> Result<CourtMap, CoreError> {
        Ok(self.client.fetch_courts(courts).await?)
    }

    async fn fetch_recent(&self) -> Result<CourtMap, CoreError> {
        Ok(self.client.fetch_recent(self.recent_window_minutes).await?)
    }

    async fn probe(
        &self,
        endpoint: &str,
        credential: Option<&SecretString>,
    ) -> Result<bool, CoreError> {
        Ok(self.client.probe(endpoint, credential).await?)
    }

    async fn list_matches(
        &self,
        endpoint: &str,
        credential: Option<&SecretString>,
    ) -> Result<Vec<MatchInfo>, CoreError> {
        Ok(self.client.list_matches(endpoint, credential).await?)
    }
}

// ── StaticDisplays ──────────────────────────────────────────────────

/// A display list held in memory and replaced wholesale by its owner.
#[derive(Default)]
pub struct StaticDisplays {
    displays: RwLock<Vec<DisplayInstance>>,
}

impl StaticDisplays {
    pub fn new(displays: Vec<DisplayInstance>) -> Self {
        Self {
            displays: RwLock::new(displays),
        }
    }

    pub fn replace(&self, displays: Vec<DisplayInstance>) {
        *self.displays.write().unwrap_or_else(PoisonError::into_inner) = displays;
    }

    pub fn snapshot(&self) -> Vec<DisplayInstance> {
        self.displays
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl DisplaySource for StaticDisplays {
    async fn active_displays(&self) -> Result<Vec<DisplayInstance>, CoreError> {
        Ok(self.snapshot())
    }
}

// ── SharedManualScore ───────────────────────────────────────────────

/// In-memory scoring session shared between the console and the engine.
#[derive(Default)]
pub struct SharedManualScore {
    current: RwLock<Option<MatchState>>,
}

impl SharedManualScore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish the match being scored.
    pub fn set(&self, state: MatchState) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(state);
    }

    /// End the session; pollers fall back to the "no active match" payload.
    pub fn clear(&self) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

#[async_trait]
impl ManualScoreSource for SharedManualScore {
    async fn current_match(&self) -> Option<MatchState> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn manual_score_set_and_clear() {
        let session = SharedManualScore::new();
        assert!(session.current_match().await.is_none());

        session.set(json!({ "matchId": "m1" }));
        assert_eq!(session.current_match().await, Some(json!({ "matchId": "m1" })));

        session.clear();
        assert!(session.current_match().await.is_none());
    }

    #[tokio::test]
    async fn static_displays_replace() {
        let displays = StaticDisplays::new(vec![DisplayInstance::new("d1", None)]);
        displays.replace(vec![
            DisplayInstance::new("d1", Some("Court 1".into())),
            DisplayInstance::new("d2", None),
        ]);
        let current = displays.active_displays().await.unwrap_or_default();
        assert_eq!(current.len(), 2);
        assert_eq!(current[0].court_filter.as_deref(), Some("Court 1"));
    }
}
