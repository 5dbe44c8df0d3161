use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;

use portal_session::portlet::{
    PersistedPortletEntity, PersistentPortletEntityWrapper, PortletDefinitionId, PortletEntity,
    PortletEntityId, PortletPreferences, StylesheetDescriptorId, WindowState,
};

fn persisted(entity_id: &str) -> Arc<PersistedPortletEntity> {
    Arc::new(PersistedPortletEntity::new(
        PortletDefinitionId("weather".to_string()),
        PortletEntityId(entity_id.to_string()),
        "n12",
        7,
    ))
}

#[test]
fn test_wrapper_overrides_entity_id_only() {
    let entity = persisted("db.31");
    let wrapper = PersistentPortletEntityWrapper::new(
        entity.clone(),
        PortletEntityId("std.weather.7".to_string()),
    );

    // The presented id is the standard one; everything else delegates.
    assert_eq!(wrapper.portlet_entity_id(), PortletEntityId("std.weather.7".to_string()));
    assert_eq!(entity.portlet_entity_id(), PortletEntityId("db.31".to_string()));
    assert_eq!(wrapper.portlet_definition_id(), PortletDefinitionId("weather".to_string()));
    assert_eq!(wrapper.layout_node_id(), "n12");
    assert_eq!(wrapper.user_id(), 7);
}

#[test]
fn test_wrapper_delegates_window_state_mutation() {
    let entity = persisted("db.31");
    let wrapper = PersistentPortletEntityWrapper::new(
        entity.clone(),
        PortletEntityId("std.weather.7".to_string()),
    );

    let stylesheet = StylesheetDescriptorId(4);
    assert!(wrapper.window_state(stylesheet).is_none());

    wrapper.set_window_state(stylesheet, WindowState::Maximized);

    // The mutation landed on the wrapped persistent entity.
    assert_eq!(entity.window_state(stylesheet), Some(WindowState::Maximized));
    assert_eq!(wrapper.window_states().len(), 1);
}

#[test]
fn test_wrapper_delegates_preferences() {
    let entity = persisted("db.31");
    let wrapper = PersistentPortletEntityWrapper::new(
        entity.clone(),
        PortletEntityId("std.weather.7".to_string()),
    );

    let mut values = HashMap::new();
    values.insert("units".to_string(), vec!["metric".to_string()]);
    wrapper.set_preferences(PortletPreferences(values.clone()));

    assert_eq!(entity.preferences(), PortletPreferences(values));
}

#[test]
fn test_wrapper_equality_follows_wrapped_entity() {
    let entity = persisted("db.31");
    let a = PersistentPortletEntityWrapper::new(
        entity.clone(),
        PortletEntityId("std.weather.7".to_string()),
    );
    let b = PersistentPortletEntityWrapper::new(
        entity,
        PortletEntityId("std.weather.99".to_string()),
    );
    let c = PersistentPortletEntityWrapper::new(
        persisted("db.32"),
        PortletEntityId("std.weather.7".to_string()),
    );

    // Same wrapped entity, different standard ids: still equal.
    assert_eq!(a, b);
    // Different wrapped entity: not equal even with the same standard id.
    assert_ne!(a, c);
}

#[test]
fn test_wrapper_hashes_by_standard_id() {
    let a = PersistentPortletEntityWrapper::new(
        persisted("db.31"),
        PortletEntityId("std.weather.7".to_string()),
    );
    let b = PersistentPortletEntityWrapper::new(
        persisted("db.99"),
        PortletEntityId("std.weather.7".to_string()),
    );

    let mut hasher_a = DefaultHasher::new();
    a.hash(&mut hasher_a);
    let mut hasher_b = DefaultHasher::new();
    b.hash(&mut hasher_b);

    assert_eq!(hasher_a.finish(), hasher_b.finish());
}
