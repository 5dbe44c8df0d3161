//! Portlet entities and the persistent-entity wrapper.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortletDefinitionId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortletEntityId(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StylesheetDescriptorId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowState {
    Normal,
    Minimized,
    Maximized,
    Exclusive,
}

/// Per-portlet preference values, keyed by preference name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortletPreferences(pub HashMap<String, Vec<String>>);

/// A portlet placed on a user's layout.
pub trait PortletEntity: Send + Sync {
    fn portlet_definition_id(&self) -> PortletDefinitionId;
    fn portlet_entity_id(&self) -> PortletEntityId;
    fn layout_node_id(&self) -> String;
    fn user_id(&self) -> i64;
    fn window_states(&self) -> HashMap<StylesheetDescriptorId, WindowState>;
    fn window_state(&self, stylesheet: StylesheetDescriptorId) -> Option<WindowState>;
    fn set_window_state(&self, stylesheet: StylesheetDescriptorId, state: WindowState);
    fn preferences(&self) -> PortletPreferences;
    fn set_preferences(&self, preferences: PortletPreferences);
}

/// A portlet entity as loaded from the persistence layer.
pub struct PersistedPortletEntity {
    definition_id: PortletDefinitionId,
    entity_id: PortletEntityId,
    layout_node_id: String,
    user_id: i64,
    window_states: Mutex<HashMap<StylesheetDescriptorId, WindowState>>,
    preferences: Mutex<PortletPreferences>,
}

impl PersistedPortletEntity {
    #[must_use]
    pub fn new(
        definition_id: PortletDefinitionId,
        entity_id: PortletEntityId,
        layout_node_id: impl Into<String>,
        user_id: i64,
    ) -> Self {
        Self {
            definition_id,
            entity_id,
            layout_node_id: layout_node_id.into(),
            user_id,
            window_states: Mutex::new(HashMap::new()),
            preferences: Mutex::new(PortletPreferences::default()),
        }
    }
}

impl PortletEntity for PersistedPortletEntity {
    fn portlet_definition_id(&self) -> PortletDefinitionId {
        self.definition_id.clone()
    }

    fn portlet_entity_id(&self) -> PortletEntityId {
        self.entity_id.clone()
    }

    fn layout_node_id(&self) -> String {
        self.layout_node_id.clone()
    }

    fn user_id(&self) -> i64 {
        self.user_id
    }

    fn window_states(&self) -> HashMap<StylesheetDescriptorId, WindowState> {
        let states = self.window_states.lock().unwrap_or_else(|e| e.into_inner());
        states.clone()
    }

    fn window_state(&self, stylesheet: StylesheetDescriptorId) -> Option<WindowState> {
        let states = self.window_states.lock().unwrap_or_else(|e| e.into_inner());
        states.get(&stylesheet).copied()
    }

    fn set_window_state(&self, stylesheet: StylesheetDescriptorId, state: WindowState) {
        let mut states = self.window_states.lock().unwrap_or_else(|e| e.into_inner());
        states.insert(stylesheet, state);
    }

    fn preferences(&self) -> PortletPreferences {
        let preferences = self.preferences.lock().unwrap_or_else(|e| e.into_inner());
        preferences.clone()
    }

    fn set_preferences(&self, preferences: PortletPreferences) {
        let mut current = self.preferences.lock().unwrap_or_else(|e| e.into_inner());
        *current = preferences;
    }
}

/// Wrapper for persistent portlet entities that overrides the entity id with
/// a consistent standard value while delegating everything else to the
/// wrapped entity.
pub struct PersistentPortletEntityWrapper {
    persistent: Arc<dyn PortletEntity>,
    standard_entity_id: PortletEntityId,
}

impl PersistentPortletEntityWrapper {
    #[must_use]
    pub fn new(persistent: Arc<dyn PortletEntity>, standard_entity_id: PortletEntityId) -> Self {
        Self {
            persistent,
            standard_entity_id,
        }
    }

    /// The wrapped persistent entity.
    pub fn persistent_entity(&self) -> &Arc<dyn PortletEntity> {
        &self.persistent
    }
}

impl PortletEntity for PersistentPortletEntityWrapper {
    fn portlet_definition_id(&self) -> PortletDefinitionId {
        self.persistent.portlet_definition_id()
    }

    fn portlet_entity_id(&self) -> PortletEntityId {
        self.standard_entity_id.clone()
    }

    fn layout_node_id(&self) -> String {
        self.persistent.layout_node_id()
    }

    fn user_id(&self) -> i64 {
        self.persistent.user_id()
    }

    fn window_states(&self) -> HashMap<StylesheetDescriptorId, WindowState> {
        self.persistent.window_states()
    }

    fn window_state(&self, stylesheet: StylesheetDescriptorId) -> Option<WindowState> {
        self.persistent.window_state(stylesheet)
    }

    fn set_window_state(&self, stylesheet: StylesheetDescriptorId, state: WindowState) {
        self.persistent.set_window_state(stylesheet, state);
    }

    fn preferences(&self) -> PortletPreferences {
        self.persistent.preferences()
    }

    fn set_preferences(&self, preferences: PortletPreferences) {
        self.persistent.set_preferences(preferences);
    }
}

// Equality follows the wrapped entity; hashing follows the standard id the
// wrapper presents.
impl PartialEq for PersistentPortletEntityWrapper {
    fn eq(&self, other: &Self) -> bool {
        self.persistent.portlet_entity_id() == other.persistent.portlet_entity_id()
    }
}

impl Eq for PersistentPortletEntityWrapper {}

impl Hash for PersistentPortletEntityWrapper {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.standard_entity_id.hash(state);
    }
}

impl std::fmt::Debug for PersistentPortletEntityWrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentPortletEntityWrapper")
            .field("standard_entity_id", &self.standard_entity_id)
            .field("persistent_entity_id", &self.persistent.portlet_entity_id())
            .finish()
    }
}
