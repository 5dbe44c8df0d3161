use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

use portal_session::core::config::{GroupStoreKind, PortalConfig};
use portal_session::errors::PortalError;
use portal_session::groups::store::{GroupStore, InMemoryGroupStore, JsonFileGroupStore};
use portal_session::groups::{EntityGroup, EntityKind, GroupMember, GroupService};

fn group(key: &str, name: &str, members: &[&str]) -> EntityGroup {
    EntityGroup {
        key: key.to_string(),
        name: name.to_string(),
        members: members.iter().map(ToString::to_string).collect(),
    }
}

fn service_with(store: InMemoryGroupStore, distinguished: &[(&str, &str)]) -> GroupService {
    let distinguished: HashMap<String, String> = distinguished
        .iter()
        .map(|(name, key)| (name.to_string(), key.to_string()))
        .collect();
    GroupService::new(Arc::new(store), distinguished)
}

#[test]
fn test_find_group_and_member_lookup() {
    let store = InMemoryGroupStore::new();
    store.put_group(group("local.staff", "Staff", &["person.7"]));
    let service = service_with(store, &[]);

    let found = service.find_group("local.staff").expect("store lookup");
    assert_eq!(found.expect("group").name, "Staff");
    assert!(service.find_group("local.missing").expect("store lookup").is_none());

    let member = service
        .get_group_member("local.staff", EntityKind::Group)
        .expect("store lookup")
        .expect("member");
    assert!(matches!(member, GroupMember::Group(_)));

    let person = service
        .get_group_member("person.7", EntityKind::Person)
        .expect("store lookup")
        .expect("member");
    assert_eq!(person.key(), "person.7");
    assert!(matches!(person, GroupMember::Entity(_)));
}

#[test]
fn test_entities_do_not_guarantee_existence() {
    let service = service_with(InMemoryGroupStore::new(), &[]);
    let entity = service.get_entity("person.404", EntityKind::Person);
    assert_eq!(entity.key, "person.404");
    assert_eq!(entity.kind, EntityKind::Person);
}

#[test]
fn test_distinguished_group_lookup() {
    let store = InMemoryGroupStore::new();
    store.put_group(group("local.0", "Everyone", &[]));
    let service = service_with(store, &[("everyone", "local.0"), ("dangling", "local.9")]);

    let everyone = service.distinguished_group("everyone").expect("configured group");
    assert_eq!(everyone.name, "Everyone");

    // No configured key for the name.
    let err = service.distinguished_group("nobody").unwrap_err();
    assert!(matches!(err, PortalError::Groups(_)));

    // Configured key pointing at a missing group.
    let err = service.distinguished_group("dangling").unwrap_err();
    assert!(matches!(err, PortalError::Groups(_)));
}

#[test]
fn test_root_group_uses_kind_name() {
    let store = InMemoryGroupStore::new();
    store.put_group(group("local.persons", "All Persons", &[]));
    let service = service_with(store, &[("person", "local.persons")]);

    let root = service.root_group(EntityKind::Person).expect("root group");
    assert_eq!(root.key, "local.persons");
}

#[test]
fn test_new_group_gets_unused_key() {
    let service = service_with(InMemoryGroupStore::new(), &[]);

    let a = service.new_group(EntityKind::Person).expect("new group");
    let b = service.new_group(EntityKind::Person).expect("new group");
    assert_ne!(a.key, b.key);
    assert!(a.key.starts_with("person:"));

    // The new group is immediately findable.
    assert!(service.find_group(&a.key).expect("store lookup").is_some());
}

#[test]
fn test_containing_groups_are_transitive_and_deduplicated() {
    let store = InMemoryGroupStore::new();
    store.put_group(group("g.staff", "Staff", &["person.7"]));
    store.put_group(group("g.admins", "Admins", &["person.7"]));
    store.put_group(group("g.employees", "Employees", &["g.staff", "g.admins"]));
    store.put_group(group("g.everyone", "Everyone", &["g.employees", "g.staff"]));
    let service = service_with(store, &[]);

    let keys = service
        .all_containing_group_keys("person.7")
        .expect("containing groups");

    // Breadth-first from the member, each group reported once.
    assert_eq!(keys, vec!["g.admins", "g.staff", "g.employees", "g.everyone"]);
}

#[test]
fn test_add_member_requires_existing_group() {
    let store = InMemoryGroupStore::new();
    store.put_group(group("g.staff", "Staff", &[]));

    store.add_member("g.staff", "person.7").expect("add member");
    // Adding twice keeps a single membership entry.
    store.add_member("g.staff", "person.7").expect("add member again");
    let staff = store.find("g.staff").expect("lookup").expect("group");
    assert_eq!(staff.members, vec!["person.7"]);

    assert!(store.add_member("g.missing", "person.7").is_err());
}

#[test]
fn test_json_file_store_loads_document() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(
        file,
        r#"{{"groups": [
            {{"key": "local.staff", "name": "Staff", "members": ["person.7"]}},
            {{"key": "local.everyone", "name": "Everyone", "members": ["local.staff"]}}
        ]}}"#
    )
    .expect("write document");

    let store = JsonFileGroupStore::load(file.path()).expect("load store");
    let staff = store.find("local.staff").expect("lookup").expect("group");
    assert_eq!(staff.members, vec!["person.7"]);

    // The file-backed store never mints new groups.
    let err = store.new_group(EntityKind::Group).unwrap_err();
    assert!(matches!(err, PortalError::Groups(_)));
}

#[test]
fn test_json_file_store_rejects_malformed_documents() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(file, "not json at all").expect("write document");

    assert!(matches!(
        JsonFileGroupStore::load(file.path()),
        Err(PortalError::Groups(_))
    ));
}

#[test]
fn test_service_from_config_selects_store() {
    let config = PortalConfig::default();
    assert_eq!(config.group_store, GroupStoreKind::InMemory);
    let service = GroupService::from_config(&config).expect("in-memory service");
    assert!(service.find_group("anything").expect("lookup").is_none());

    // json-file without a path is a configuration error.
    let config = PortalConfig {
        group_store: GroupStoreKind::JsonFile,
        group_store_path: None,
        ..PortalConfig::default()
    };
    assert!(matches!(
        GroupService::from_config(&config),
        Err(PortalError::Config(_))
    ));

    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(file, r#"{{"groups": []}}"#).expect("write document");
    let config = PortalConfig {
        group_store: GroupStoreKind::JsonFile,
        group_store_path: Some(file.path().to_path_buf()),
        ..PortalConfig::default()
    };
    GroupService::from_config(&config).expect("json-file service");
}
