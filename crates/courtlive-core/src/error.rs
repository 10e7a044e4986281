// ── Core error types ──
//
// User-facing errors from courtlive-core. Consumers never see HTTP status
// codes or envelope parse failures directly: the `From<courtlive_api::Error>`
// impl folds transport-layer errors into `Fetch`.

use thiserror::Error;

use crate::model::ConnectionId;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Registry errors ──────────────────────────────────────────────
    #[error("Connection not found: {id}")]
    ConnectionNotFound { id: ConnectionId },

    #[error("No binding for component: {component_id}")]
    BindingNotFound { component_id: String },

    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    // ── Runtime errors ───────────────────────────────────────────────
    #[error("Fetch failed: {message}")]
    Fetch { message: String },

    #[error("Persistence failed: {message}")]
    Persistence { message: String },

    #[error("Court sync is already running")]
    SyncAlreadyRunning,

    #[error("Court sync is not running")]
    SyncNotRunning,

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn validation(field: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_owned(),
            reason: reason.into(),
        }
    }

    pub(crate) fn persistence(message: impl std::fmt::Display) -> Self {
        Self::Persistence {
            message: message.to_string(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<courtlive_api::Error> for CoreError {
    fn from(err: courtlive_api::Error) -> Self {
        match err {
            courtlive_api::Error::InvalidUrl(e) => CoreError::Validation {
                field: "endpoint".into(),
                reason: e.to_string(),
            },
            courtlive_api::Error::FeedNotConfigured => CoreError::Validation {
                field: "feed.url".into(),
                reason: "no court feed is configured".into(),
            },
            other => CoreError::Fetch {
                message: other.to_string(),
            },
        }
    }
}
