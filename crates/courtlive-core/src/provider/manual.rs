use crate::backend::ManualScoreSource;
use crate::model::MatchState;
use crate::model::tennis::TennisMatch;

/// Reads whatever the operator is scoring right now.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualConsole;

impl ManualConsole {
    pub(crate) async fn fetch(self, source: &dyn ManualScoreSource) -> MatchState {
        match source.current_match().await {
            Some(state) => state,
            None => TennisMatch::no_active_match().to_value(),
        }
    }
}
