use thiserror::Error;

/// Top-level error type for the `courtlive-api` crate.
///
/// Covers transport failures, non-success HTTP statuses, the
/// `{ success, data, error }` envelope, and payload decoding.
/// `courtlive-core` folds all of these into its fetch-failure variant.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The service rejected the bearer key (HTTP 401).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Non-success HTTP status.
    #[error("API request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    // ── Envelope ────────────────────────────────────────────────────
    /// The envelope reported `success: false`.
    #[error("API error: {message}")]
    Api { message: String },

    /// The envelope reported success but carried no `data`.
    #[error("No data in response from {endpoint}")]
    EmptyResponse { endpoint: String },

    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── Feed ────────────────────────────────────────────────────────
    /// A feed call was made on a client built without a feed URL.
    #[error("Court feed URL is not configured")]
    FeedNotConfigured,
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if the service rejected the credentials.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }
}
