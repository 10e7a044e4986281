use serde::{Deserialize, Serialize};

/// A graphics output window as reported by the display source.
///
/// Read-only to the engine. `court_filter` names the court the display is
/// showing, if it is scoped to one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayInstance {
    pub id: String,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub court_filter: Option<String>,
}

impl DisplayInstance {
    pub fn new(id: impl Into<String>, court_filter: Option<String>) -> Self {
        Self {
            id: id.into(),
            is_active: true,
            court_filter,
        }
    }
}
