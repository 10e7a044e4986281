// ── Component bindings ──

use serde::{Deserialize, Serialize};

use super::connection::ConnectionId;
use crate::error::CoreError;

/// Maps one on-screen component to a value inside a connection's payload.
///
/// `data_path` is a dot-separated path such as `score.player1Sets`.
/// A component has at most one binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentBinding {
    pub component_id: String,
    pub connection_id: ConnectionId,
    pub data_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_interval_ms: Option<u64>,
}

impl ComponentBinding {
    pub fn new(
        component_id: impl Into<String>,
        connection_id: ConnectionId,
        data_path: impl Into<String>,
    ) -> Self {
        Self {
            component_id: component_id.into(),
            connection_id,
            data_path: data_path.into(),
            update_interval_ms: None,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), CoreError> {
        if self.component_id.trim().is_empty() {
            return Err(CoreError::validation("component_id", "must not be empty"));
        }
        if self.data_path.trim().is_empty() {
            return Err(CoreError::validation("data_path", "must not be empty"));
        }
        Ok(())
    }

    pub(crate) fn apply(&mut self, patch: BindingPatch) {
        if let Some(connection_id) = patch.connection_id {
            self.connection_id = connection_id;
        }
        if let Some(data_path) = patch.data_path {
            self.data_path = data_path;
        }
        if let Some(interval) = patch.update_interval_ms {
            self.update_interval_ms = interval;
        }
    }
}

/// Partial edit of a binding.
#[derive(Debug, Clone, Default)]
pub struct BindingPatch {
    pub connection_id: Option<ConnectionId>,
    pub data_path: Option<String>,
    pub update_interval_ms: Option<Option<u64>>,
}
