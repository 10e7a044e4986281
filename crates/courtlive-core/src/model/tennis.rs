// ── Tennis match shape ──
//
// The canonical camelCase payload produced by the simulator and the manual
// console, and the normalizer that folds third-party tennis payloads into
// it. Field aliases (snake_case or camelCase, `team1` for `player1`, `id`
// for `matchId`) are accepted on input; output always uses one spelling.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Canonical tennis match payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TennisMatch {
    pub match_id: String,
    pub player1: Player,
    pub player2: Player,
    pub score: Score,
    /// Games per set, keyed by set number ("1", "2", ...).
    pub sets: BTreeMap<String, SetScore>,
    pub match_status: String,
    pub serving_player: u8,
    pub current_set: u32,
    pub is_tiebreak: bool,
    pub tiebreak_score: Option<SetScore>,
    pub tournament: Option<String>,
    pub round: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub country: Option<String>,
    pub seed: Option<i64>,
}

impl Player {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            country: None,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    pub player1_sets: i64,
    pub player2_sets: i64,
    pub player1_games: i64,
    pub player2_games: i64,
    pub player1_points: String,
    pub player2_points: String,
}

impl Default for Score {
    fn default() -> Self {
        Self {
            player1_sets: 0,
            player2_sets: 0,
            player1_games: 0,
            player2_games: 0,
            player1_points: "0".into(),
            player2_points: "0".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetScore {
    pub player1: i64,
    pub player2: i64,
}

pub const STATUS_IN_PROGRESS: &str = "in_progress";
pub const STATUS_COMPLETED: &str = "completed";
pub const STATUS_NO_ACTIVE_MATCH: &str = "no_active_match";

impl TennisMatch {
    /// Payload reported when a source has no match to show.
    ///
    /// Every field is present so bound paths resolve to neutral values
    /// instead of vanishing.
    pub fn no_active_match() -> Self {
        Self {
            match_id: String::new(),
            player1: Player::named("Player 1"),
            player2: Player::named("Player 2"),
            score: Score::default(),
            sets: BTreeMap::new(),
            match_status: STATUS_NO_ACTIVE_MATCH.into(),
            serving_player: 1,
            current_set: 1,
            is_tiebreak: false,
            tiebreak_score: None,
            tournament: None,
            round: None,
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

// ── Normalization ───────────────────────────────────────────────────

/// Fold a raw tennis payload into the canonical shape.
///
/// Non-object input yields the "no active match" payload with the match id
/// defaulted to `unknown`.
pub fn normalize(raw: &Value) -> Value {
    let empty = Map::new();
    let obj = raw.as_object().unwrap_or(&empty);

    let match_id = pick(obj, &["match_id", "matchId", "id"])
        .and_then(as_text)
        .unwrap_or_else(|| "unknown".into());

    let player1 = player(pick(obj, &["player1", "team1"]), "Player 1");
    let player2 = player(pick(obj, &["player2", "team2"]), "Player 2");

    let score = pick(obj, &["score"])
        .and_then(Value::as_object)
        .map(score)
        .unwrap_or_default();

    let sets = pick(obj, &["sets"])
        .and_then(Value::as_object)
        .map(|sets| {
            sets.iter()
                .map(|(key, set)| (key.clone(), set_score(set)))
                .collect()
        })
        .unwrap_or_default();

    let serving_player = pick(obj, &["serving_player", "servingPlayer"])
        .and_then(Value::as_i64)
        .unwrap_or(1)
        .clamp(1, 4);
    let serving_player = u8::try_from(serving_player).unwrap_or(1);

    let current_set = pick(obj, &["current_set", "currentSet"])
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(1);

    let is_tiebreak = pick(obj, &["is_tiebreak", "isTiebreak"])
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let tiebreak_score = pick(obj, &["tiebreak_score", "tiebreakScore"]).map(set_score);

    let match_status = pick(obj, &["match_status", "matchStatus"])
        .and_then(as_text)
        .unwrap_or_else(|| STATUS_IN_PROGRESS.into());

    TennisMatch {
        match_id,
        player1,
        player2,
        score,
        sets,
        match_status,
        serving_player,
        current_set,
        is_tiebreak,
        tiebreak_score,
        tournament: pick(obj, &["tournament"]).and_then(as_text),
        round: pick(obj, &["round"]).and_then(as_text),
    }
    .to_value()
}

/// A payload is usable when it names a match and at least its first side.
pub fn is_valid(raw: &Value) -> bool {
    let Some(obj) = raw.as_object() else {
        return false;
    };
    pick(obj, &["match_id", "matchId", "id"]).is_some() && pick(obj, &["player1", "team1"]).is_some()
}

/// Canonical point label: `love` → `0`, any advantage spelling → `AD`.
pub fn normalize_points(points: &str) -> String {
    match points.trim().to_ascii_lowercase().as_str() {
        "love" | "0" => "0".into(),
        "a" | "ad" | "adv" | "advantage" => "AD".into(),
        _ => points.trim().to_owned(),
    }
}

/// First non-null value among `keys`.
fn pick<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| obj.get(*key))
        .find(|value| !value.is_null())
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn player(raw: Option<&Value>, default_name: &str) -> Player {
    let Some(obj) = raw.and_then(Value::as_object) else {
        return Player::named(default_name);
    };
    Player {
        name: pick(obj, &["name"])
            .and_then(as_text)
            .unwrap_or_else(|| default_name.to_owned()),
        country: pick(obj, &["country"]).and_then(as_text),
        seed: pick(obj, &["seed"]).and_then(Value::as_i64),
    }
}

fn score(obj: &Map<String, Value>) -> Score {
    let count = |keys: &[&str]| pick(obj, keys).and_then(Value::as_i64).unwrap_or(0);
    let points = |keys: &[&str]| {
        pick(obj, keys)
            .and_then(as_text)
            .map_or_else(|| "0".to_owned(), |p| normalize_points(&p))
    };
    Score {
        player1_sets: count(&["player1_sets", "player1Sets"]),
        player2_sets: count(&["player2_sets", "player2Sets"]),
        player1_games: count(&["player1_games", "player1Games"]),
        player2_games: count(&["player2_games", "player2Games"]),
        player1_points: points(&["player1_points", "player1Points"]),
        player2_points: points(&["player2_points", "player2Points"]),
    }
}

fn set_score(raw: &Value) -> SetScore {
    let side = |key: &str| raw.get(key).and_then(Value::as_i64).unwrap_or(0);
    SetScore {
        player1: side("player1"),
        player2: side("player2"),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn normalizes_snake_case_aliases() {
        let raw = json!({
            "id": "m-7",
            "team1": { "name": "Doubles A", "seed": 2 },
            "player2": { "name": "B. Player", "country": "ESP" },
            "score": {
                "player1_sets": 1,
                "player2Sets": 0,
                "player1_games": 3,
                "player2_games": 2,
                "player1_points": "Advantage",
                "player2_points": 40
            },
            "sets": { "1": { "player1": 6, "player2": 4 } },
            "serving_player": 9,
            "current_set": 2
        });

        let out = normalize(&raw);

        assert_eq!(out["matchId"], "m-7");
        assert_eq!(out["player1"]["name"], "Doubles A");
        assert_eq!(out["player1"]["seed"], 2);
        assert_eq!(out["player2"]["country"], "ESP");
        assert_eq!(out["score"]["player1Sets"], 1);
        assert_eq!(out["score"]["player1Points"], "AD");
        assert_eq!(out["score"]["player2Points"], "40");
        assert_eq!(out["sets"]["1"]["player1"], 6);
        assert_eq!(out["servingPlayer"], 4);
        assert_eq!(out["currentSet"], 2);
        assert_eq!(out["matchStatus"], "in_progress");
        assert_eq!(out["isTiebreak"], false);
    }

    #[test]
    fn normalize_fills_defaults() {
        let out = normalize(&json!({ "matchId": "x" }));
        assert_eq!(out["player1"]["name"], "Player 1");
        assert_eq!(out["player2"]["name"], "Player 2");
        assert_eq!(out["score"]["player2Points"], "0");
        assert_eq!(out["servingPlayer"], 1);
        assert_eq!(out["currentSet"], 1);
        assert!(out["tiebreakScore"].is_null());
    }

    #[test]
    fn normalize_non_object_is_unknown_match() {
        let out = normalize(&json!("garbage"));
        assert_eq!(out["matchId"], "unknown");
    }

    #[test]
    fn love_and_advantage_spellings() {
        assert_eq!(normalize_points("Love"), "0");
        assert_eq!(normalize_points("a"), "AD");
        assert_eq!(normalize_points("ad"), "AD");
        assert_eq!(normalize_points("15"), "15");
    }

    #[test]
    fn validity_requires_id_and_first_side() {
        assert!(is_valid(&json!({ "id": "1", "team1": {} })));
        assert!(!is_valid(&json!({ "id": "1" })));
        assert!(!is_valid(&json!({ "player1": {} })));
        assert!(!is_valid(&json!([1, 2])));
    }

    #[test]
    fn no_active_match_has_every_field() {
        let value = TennisMatch::no_active_match().to_value();
        let obj = value.as_object().expect("object");
        for key in [
            "matchId",
            "player1",
            "player2",
            "score",
            "sets",
            "matchStatus",
            "servingPlayer",
            "currentSet",
            "isTiebreak",
            "tiebreakScore",
            "tournament",
            "round",
        ] {
            assert!(obj.contains_key(key), "missing {key}");
        }
        assert_eq!(value["matchStatus"], "no_active_match");
    }
}
