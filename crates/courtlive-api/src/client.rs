// Live-score HTTP client
//
// Wraps `reqwest::Client` with bearer-key auth and `{ success, data, error }`
// envelope unwrapping. Feed endpoints live in `feed.rs` as inherent methods
// to keep this module focused on transport mechanics.

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::{ApiResponse, MatchInfo};
use crate::transport::TransportConfig;

/// Raw HTTP client for live-score services.
///
/// Per-match calls take the endpoint and key from the caller (each
/// configured connection has its own). Feed calls use the feed URL and key
/// fixed at construction.
#[derive(Clone)]
pub struct LiveClient {
    http: reqwest::Client,
    pub(crate) feed_url: Option<Url>,
    pub(crate) feed_key: Option<SecretString>,
}

impl LiveClient {
    /// Create a client from a `TransportConfig`.
    pub fn new(
        transport: &TransportConfig,
        feed_url: Option<Url>,
        feed_key: Option<SecretString>,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            feed_url,
            feed_key,
        })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        feed_url: Option<Url>,
        feed_key: Option<SecretString>,
    ) -> Self {
        Self {
            http,
            feed_url,
            feed_key,
        }
    }

    /// The configured feed base URL, if any.
    pub fn feed_url(&self) -> Option<&Url> {
        self.feed_url.as_ref()
    }

    // ── Per-match endpoints ──────────────────────────────────────────

    /// Fetch the current state of one match.
    ///
    /// `GET {endpoint}` with `Authorization: Bearer {key}`.
    pub async fn fetch_match(
        &self,
        endpoint: &str,
        api_key: Option<&SecretString>,
    ) -> Result<serde_json::Value, Error> {
        let url = Url::parse(endpoint)?;
        self.get(url, api_key).await
    }

    /// Check whether an endpoint answers with a success status.
    ///
    /// Returns `Ok(false)` for a reachable service that rejects the request,
    /// and `Err` only when the request could not be made at all.
    pub async fn probe(&self, endpoint: &str, api_key: Option<&SecretString>) -> Result<bool, Error> {
        let url = Url::parse(endpoint)?;
        debug!("PROBE {}", url);
        let resp = authorize(self.http.get(url), api_key).send().await?;
        Ok(resp.status().is_success())
    }

    /// List the matches the service knows about.
    ///
    /// `GET {endpoint}/matches`
    pub async fn list_matches(
        &self,
        endpoint: &str,
        api_key: Option<&SecretString>,
    ) -> Result<Vec<MatchInfo>, Error> {
        let url = Url::parse(&format!("{}/matches", endpoint.trim_end_matches('/')))?;
        self.get(url, api_key).await
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and unwrap the envelope.
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        url: Url,
        api_key: Option<&SecretString>,
    ) -> Result<T, Error> {
        debug!("GET {}", url);

        let endpoint = url.to_string();
        let resp = authorize(self.http.get(url), api_key).send().await?;

        parse_envelope(resp, &endpoint).await
    }
}

fn authorize(
    builder: reqwest::RequestBuilder,
    api_key: Option<&SecretString>,
) -> reqwest::RequestBuilder {
    match api_key {
        Some(key) => builder.bearer_auth(key.expose_secret()),
        None => builder,
    }
}

/// Parse the `{ success, data, error }` envelope, returning `data` on success.
async fn parse_envelope<T: DeserializeOwned>(
    resp: reqwest::Response,
    endpoint: &str,
) -> Result<T, Error> {
    let status = resp.status();

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(Error::Authentication {
            message: "invalid or missing API key".into(),
        });
    }

    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::Status {
            status: status.as_u16(),
            message: preview(&body).to_owned(),
        });
    }

    let body = resp.text().await?;

    let envelope: ApiResponse<T> = serde_json::from_str(&body).map_err(|e| {
        Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body: body.clone(),
        }
    })?;

    if !envelope.success {
        return Err(Error::Api {
            message: envelope
                .error
                .unwrap_or_else(|| "Unknown API error".to_owned()),
        });
    }

    envelope.data.ok_or_else(|| Error::EmptyResponse {
        endpoint: endpoint.to_owned(),
    })
}

fn preview(body: &str) -> &str {
    let mut end = body.len().min(200);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

#[cfg(test)]
mod tests {
    use super::preview;

    #[test]
    fn preview_truncates_on_char_boundary() {
        let body = "é".repeat(150);
        let cut = preview(&body);
        assert!(cut.len() <= 200);
        assert!(cut.chars().all(|c| c == 'é'));
    }

    #[test]
    fn preview_keeps_short_bodies() {
        assert_eq!(preview("oops"), "oops");
    }
}
