// ── Connection registry ──
//
// Connections and component bindings, keyed for O(1) lookup. The registry
// is pure bookkeeping: it never spawns tasks or touches the data cache.
// The engine layers pollers and persistence on top.
//
// Lock order: a connection entry is always taken before any binding entry.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::warn;

use crate::error::CoreError;
use crate::model::{
    BindingPatch, ComponentBinding, Connection, ConnectionDraft, ConnectionId, ConnectionPatch,
};
use crate::persist::{ConnectionRecord, PersistedState};

/// Configured connections and the bindings that read from them.
#[derive(Default)]
pub struct Registry {
    pub(crate) connections: DashMap<ConnectionId, Connection>,
    pub(crate) bindings: DashMap<String, ComponentBinding>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a registry from saved state.
    ///
    /// Bindings that reference a connection missing from the state are
    /// dropped with a warning. Activation flags are restored as saved.
    pub fn from_persisted(state: PersistedState) -> Self {
        let registry = Self::new();
        registry.load(state);
        registry
    }

    /// Replace everything in the registry with `state`.
    pub(crate) fn load(&self, state: PersistedState) {
        self.bindings.clear();
        self.connections.clear();

        for record in state.connections {
            let conn = record.into_connection();
            self.connections.insert(conn.id, conn);
        }
        for binding in state.bindings {
            if self.connections.contains_key(&binding.connection_id) {
                self.bindings.insert(binding.component_id.clone(), binding);
            } else {
                warn!(
                    component = %binding.component_id,
                    connection = %binding.connection_id,
                    "dropping saved binding for unknown connection"
                );
            }
        }
    }

    /// Snapshot of everything worth saving, in a stable order.
    pub fn to_persisted(&self) -> PersistedState {
        let mut connections: Vec<ConnectionRecord> = self
            .connections
            .iter()
            .map(|r| ConnectionRecord::from(r.value()))
            .collect();
        connections.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

        let mut bindings: Vec<ComponentBinding> =
            self.bindings.iter().map(|r| r.value().clone()).collect();
        bindings.sort_by(|a, b| a.component_id.cmp(&b.component_id));

        PersistedState::new(connections, bindings)
    }

    // ── Connections ──────────────────────────────────────────────────

    pub fn add_connection(&self, draft: ConnectionDraft) -> Result<ConnectionId, CoreError> {
        draft.validate()?;
        let id = ConnectionId::new();
        self.connections
            .insert(id, Connection::from_draft(id, draft));
        Ok(id)
    }

    /// Apply `patch` and return the updated connection.
    ///
    /// The edit is validated before it is stored; an invalid patch leaves
    /// the connection untouched.
    pub fn update_connection(
        &self,
        id: &ConnectionId,
        patch: ConnectionPatch,
    ) -> Result<Connection, CoreError> {
        let mut entry = self
            .connections
            .get_mut(id)
            .ok_or(CoreError::ConnectionNotFound { id: *id })?;
        let mut candidate = entry.clone();
        candidate.apply(patch);
        candidate.validate()?;
        *entry = candidate;
        Ok(entry.clone())
    }

    /// Remove a connection and every binding that reads from it.
    pub fn remove_connection(
        &self,
        id: &ConnectionId,
    ) -> Result<(Connection, Vec<ComponentBinding>), CoreError> {
        let (_, conn) = self
            .connections
            .remove(id)
            .ok_or(CoreError::ConnectionNotFound { id: *id })?;

        let mut orphaned = Vec::new();
        self.bindings.retain(|_, binding| {
            if binding.connection_id == *id {
                orphaned.push(binding.clone());
                false
            } else {
                true
            }
        });
        orphaned.sort_by(|a, b| a.component_id.cmp(&b.component_id));
        Ok((conn, orphaned))
    }

    /// Flip the activation flag. Returns `true` if it changed.
    ///
    /// Activating stamps `activated_at`; deactivating leaves status fields
    /// as they were so the last payload time stays visible.
    pub fn set_active(
        &self,
        id: &ConnectionId,
        active: bool,
        now: DateTime<Utc>,
    ) -> Result<bool, CoreError> {
        let mut conn = self
            .connections
            .get_mut(id)
            .ok_or(CoreError::ConnectionNotFound { id: *id })?;
        if conn.is_active == active {
            return Ok(false);
        }
        conn.is_active = active;
        if active {
            conn.activated_at = Some(now);
        }
        Ok(true)
    }

    pub fn connection(&self, id: &ConnectionId) -> Option<Connection> {
        self.connections.get(id).map(|r| r.value().clone())
    }

    /// All connections, ordered by name.
    pub fn connections(&self) -> Vec<Connection> {
        let mut all: Vec<Connection> = self.connections.iter().map(|r| r.value().clone()).collect();
        all.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        all
    }

    pub fn active_ids(&self) -> Vec<ConnectionId> {
        self.connections
            .iter()
            .filter(|r| r.is_active)
            .map(|r| *r.key())
            .collect()
    }

    // ── Bindings ─────────────────────────────────────────────────────

    /// Bind a component, replacing any binding it already had.
    /// Returns the replaced binding.
    pub fn add_binding(
        &self,
        binding: ComponentBinding,
    ) -> Result<Option<ComponentBinding>, CoreError> {
        binding.validate()?;
        // Holding the connection entry keeps a concurrent removal from
        // slipping in between the check and the insert.
        let _conn = self
            .connections
            .get(&binding.connection_id)
            .ok_or(CoreError::ConnectionNotFound {
                id: binding.connection_id,
            })?;
        Ok(self
            .bindings
            .insert(binding.component_id.clone(), binding))
    }

    pub fn update_binding(
        &self,
        component_id: &str,
        patch: BindingPatch,
    ) -> Result<ComponentBinding, CoreError> {
        let mut candidate = self
            .binding(component_id)
            .ok_or_else(|| CoreError::BindingNotFound {
                component_id: component_id.to_owned(),
            })?;
        candidate.apply(patch);
        candidate.validate()?;

        let _conn = self
            .connections
            .get(&candidate.connection_id)
            .ok_or(CoreError::ConnectionNotFound {
                id: candidate.connection_id,
            })?;
        let mut entry = self
            .bindings
            .get_mut(component_id)
            .ok_or_else(|| CoreError::BindingNotFound {
                component_id: component_id.to_owned(),
            })?;
        *entry = candidate;
        Ok(entry.clone())
    }

    pub fn remove_binding(&self, component_id: &str) -> Result<ComponentBinding, CoreError> {
        self.bindings
            .remove(component_id)
            .map(|(_, b)| b)
            .ok_or_else(|| CoreError::BindingNotFound {
                component_id: component_id.to_owned(),
            })
    }

    pub fn binding(&self, component_id: &str) -> Option<ComponentBinding> {
        self.bindings.get(component_id).map(|r| r.value().clone())
    }

    /// All bindings, ordered by component id.
    pub fn bindings(&self) -> Vec<ComponentBinding> {
        let mut all: Vec<ComponentBinding> =
            self.bindings.iter().map(|r| r.value().clone()).collect();
        all.sort_by(|a, b| a.component_id.cmp(&b.component_id));
        all
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::ProviderKind;

    fn sim(registry: &Registry, name: &str) -> ConnectionId {
        registry
            .add_connection(ConnectionDraft::new(name, ProviderKind::Simulated))
            .unwrap()
    }

    #[test]
    fn remove_cascades_bindings() {
        let registry = Registry::new();
        let a = sim(&registry, "A");
        let b = sim(&registry, "B");
        registry
            .add_binding(ComponentBinding::new("c1", a, "score.player1Sets"))
            .unwrap();
        registry
            .add_binding(ComponentBinding::new("c2", a, "matchStatus"))
            .unwrap();
        registry
            .add_binding(ComponentBinding::new("c3", b, "matchStatus"))
            .unwrap();

        let (removed, orphaned) = registry.remove_connection(&a).unwrap();

        assert_eq!(removed.name, "A");
        assert_eq!(
            orphaned.iter().map(|b| b.component_id.as_str()).collect::<Vec<_>>(),
            vec!["c1", "c2"]
        );
        assert_eq!(registry.bindings().len(), 1);
        assert!(registry.bindings().iter().all(|b| b.connection_id != a));
    }

    #[test]
    fn binding_for_unknown_connection_is_rejected() {
        let registry = Registry::new();
        let err = registry
            .add_binding(ComponentBinding::new("c1", ConnectionId::new(), "x"))
            .unwrap_err();
        assert!(matches!(err, CoreError::ConnectionNotFound { .. }));
        assert!(registry.bindings().is_empty());
    }

    #[test]
    fn binding_replaces_previous_for_component() {
        let registry = Registry::new();
        let a = sim(&registry, "A");
        registry
            .add_binding(ComponentBinding::new("c1", a, "old"))
            .unwrap();
        let replaced = registry
            .add_binding(ComponentBinding::new("c1", a, "new"))
            .unwrap();

        assert_eq!(replaced.unwrap().data_path, "old");
        assert_eq!(registry.binding("c1").unwrap().data_path, "new");
        assert_eq!(registry.bindings().len(), 1);
    }

    #[test]
    fn invalid_update_leaves_connection_untouched() {
        let registry = Registry::new();
        let a = sim(&registry, "A");
        let err = registry
            .update_connection(
                &a,
                ConnectionPatch {
                    poll_interval_secs: Some(0),
                    ..ConnectionPatch::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));
        assert_eq!(registry.connection(&a).unwrap().poll_interval_secs, 5);
    }

    #[test]
    fn set_active_reports_changes() {
        let registry = Registry::new();
        let a = sim(&registry, "A");
        let now = Utc::now();

        assert!(registry.set_active(&a, true, now).unwrap());
        assert!(!registry.set_active(&a, true, now).unwrap());
        assert_eq!(registry.connection(&a).unwrap().activated_at, Some(now));
        assert_eq!(registry.active_ids(), vec![a]);

        assert!(matches!(
            registry.set_active(&ConnectionId::new(), true, now),
            Err(CoreError::ConnectionNotFound { .. })
        ));
    }

    #[test]
    fn persisted_round_trip_drops_orphaned_bindings() {
        let registry = Registry::new();
        let a = sim(&registry, "A");
        registry
            .add_binding(ComponentBinding::new("c1", a, "matchStatus"))
            .unwrap();

        let mut state = registry.to_persisted();
        state
            .bindings
            .push(ComponentBinding::new("ghost", ConnectionId::new(), "x"));

        let restored = Registry::from_persisted(state);
        assert_eq!(restored.connections().len(), 1);
        assert_eq!(restored.bindings().len(), 1);
        assert_eq!(restored.binding("c1").unwrap().connection_id, a);
    }

    #[test]
    fn unknown_binding_errors() {
        let registry = Registry::new();
        assert!(matches!(
            registry.remove_binding("nope"),
            Err(CoreError::BindingNotFound { .. })
        ));
        assert!(matches!(
            registry.update_binding("nope", BindingPatch::default()),
            Err(CoreError::BindingNotFound { .. })
        ));
    }
}
