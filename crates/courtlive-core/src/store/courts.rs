// ── Court tier ──
//
// Merge, scoping, and age-based expiry for the per-court cache. Only the
// sync coordinator writes here.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use super::DataStore;
use crate::model::MatchState;

/// The latest payload seen for one court.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourtEntry {
    pub court_name: String,
    pub payload: MatchState,
    pub last_updated_at: DateTime<Utc>,
}

impl DataStore {
    /// Overwrite the entry for every court in `courts`, stamping each with
    /// `now`. Returns the number of courts written.
    pub(crate) fn merge_courts(
        &self,
        courts: impl IntoIterator<Item = (String, MatchState)>,
        now: DateTime<Utc>,
    ) -> usize {
        let written = self.courts.upsert_many(courts.into_iter().map(|(name, payload)| {
            let entry = CourtEntry {
                court_name: name.clone(),
                payload,
                last_updated_at: now,
            };
            (name, entry)
        }));
        if written > 0 {
            self.mark_written(now);
        }
        written
    }

    /// Drop every court not named in `keep`. Returns the dropped names.
    pub(crate) fn retain_courts(&self, keep: &[String]) -> Vec<String> {
        self.courts.retain(|name, _| keep.iter().any(|k| k == name))
    }

    /// Drop courts last refreshed more than `max_age` before `now`.
    pub(crate) fn expire_courts(&self, now: DateTime<Utc>, max_age: TimeDelta) -> Vec<String> {
        self.courts
            .retain(|_, entry| now.signed_duration_since(entry.last_updated_at) <= max_age)
    }
}
