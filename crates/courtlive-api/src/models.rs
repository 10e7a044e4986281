// Wire types shared by the match and feed endpoints.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Court name -> latest match payload, as returned by the feed.
pub type CourtMap = HashMap<String, serde_json::Value>;

/// The `{ success, data, error }` envelope every endpoint wraps its payload in.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

/// Summary row returned by `GET {endpoint}/matches`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchInfo {
    pub match_id: String,
    pub player1_name: String,
    pub player2_name: String,
    pub tournament: String,
    pub round: String,
    pub status: String,
}
