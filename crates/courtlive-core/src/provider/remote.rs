// ── Remote providers ──
//
// Both variants go through the `MatchBackend`; neither knows anything
// about the wire.

use secrecy::SecretString;
use serde_json::{Map, Value};

use crate::backend::MatchBackend;
use crate::error::CoreError;
use crate::model::tennis;
use crate::model::{Connection, MatchState};

/// One match from a per-connection endpoint.
#[derive(Debug, Clone)]
pub struct PolledApi {
    endpoint: String,
    credential: Option<SecretString>,
    normalize: bool,
}

impl PolledApi {
    pub fn from_connection(conn: &Connection) -> Result<Self, CoreError> {
        let endpoint = conn
            .endpoint
            .clone()
            .ok_or_else(|| CoreError::validation("endpoint", "required for polled-api connections"))?;
        Ok(Self {
            endpoint,
            credential: conn.credential.clone(),
            normalize: conn.normalize,
        })
    }

    pub(crate) async fn fetch(&self, backend: &dyn MatchBackend) -> Result<MatchState, CoreError> {
        let raw = backend
            .fetch_one(&self.endpoint, self.credential.as_ref())
            .await?;
        if self.normalize {
            canonical(&raw)
        } else {
            Ok(raw)
        }
    }
}

/// Normalized payload, or a fetch error when the raw one names no match.
fn canonical(raw: &Value) -> Result<MatchState, CoreError> {
    if tennis::is_valid(raw) {
        Ok(tennis::normalize(raw))
    } else {
        Err(CoreError::Fetch {
            message: "payload has no match id or first player".into(),
        })
    }
}

/// The multi-court feed, scoped to one court or covering all recent ones.
#[derive(Debug, Clone)]
pub struct StreamedFeed {
    court: Option<String>,
    normalize: bool,
}

impl StreamedFeed {
    pub fn from_connection(conn: &Connection) -> Self {
        Self {
            court: conn
                .court
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_owned),
            normalize: conn.normalize,
        }
    }

    /// A scoped feed yields that court's payload and fails when the feed has
    /// nothing usable for it. An unscoped feed yields an object keyed by
    /// court; with normalization on, courts without a valid match are left out.
    pub(crate) async fn fetch(&self, backend: &dyn MatchBackend) -> Result<MatchState, CoreError> {
        match &self.court {
            Some(court) => {
                let mut courts = backend.fetch_courts(std::slice::from_ref(court)).await?;
                let raw = courts.remove(court).ok_or_else(|| CoreError::Fetch {
                    message: format!("feed has no data for court '{court}'"),
                })?;
                if self.normalize {
                    canonical(&raw)
                } else {
                    Ok(raw)
                }
            }
            None => {
                let courts = backend.fetch_recent().await?;
                let by_court: Map<String, Value> = if self.normalize {
                    courts
                        .into_iter()
                        .filter_map(|(name, raw)| canonical(&raw).ok().map(|v| (name, v)))
                        .collect()
                } else {
                    courts.into_iter().collect()
                };
                Ok(Value::Object(by_court))
            }
        }
    }
}
