// courtlive-api: Async Rust client for live match-score services
//
// Two surfaces share one `reqwest::Client`:
//
// - per-match endpoints (`fetch_match`, `probe`, `list_matches`), addressed by
//   a caller-supplied endpoint URL and optional bearer key
// - the multi-court feed (`fetch_courts`, `fetch_recent`), addressed by the
//   feed base URL configured on the client

pub mod client;
pub mod error;
pub mod feed;
pub mod models;
pub mod transport;

pub use client::LiveClient;
pub use error::Error;
pub use models::{ApiResponse, CourtMap, MatchInfo};
pub use transport::{TlsMode, TransportConfig};
