//! Group store implementations.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::{EntityGroup, EntityKind};
use crate::errors::PortalError;

/// Storage backend for the groups system.
pub trait GroupStore: Send + Sync {
    /// Returns the group stored under `key`, if any.
    fn find(&self, key: &str) -> Result<Option<EntityGroup>, PortalError>;

    /// Groups that directly list `member_key` as a member.
    fn containing_groups(&self, member_key: &str) -> Result<Vec<EntityGroup>, PortalError>;

    /// Creates and stores a new empty group with an unused key.
    fn new_group(&self, kind: EntityKind) -> Result<EntityGroup, PortalError>;
}

/// Mutable in-process group store. The default backend; also the seed store
/// for tests.
#[derive(Default)]
pub struct InMemoryGroupStore {
    groups: Mutex<HashMap<String, EntityGroup>>,
}

impl InMemoryGroupStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a group.
    pub fn put_group(&self, group: EntityGroup) {
        let mut groups = self.groups.lock().unwrap_or_else(|e| e.into_inner());
        groups.insert(group.key.clone(), group);
    }

    /// Adds `member_key` to the group stored under `group_key`.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::Groups`] if no such group exists.
    pub fn add_member(&self, group_key: &str, member_key: &str) -> Result<(), PortalError> {
        let mut groups = self.groups.lock().unwrap_or_else(|e| e.into_inner());
        let group = groups.get_mut(group_key).ok_or_else(|| {
            PortalError::Groups(format!("no group with key '{group_key}'"))
        })?;
        if !group.members.iter().any(|m| m == member_key) {
            group.members.push(member_key.to_string());
        }
        Ok(())
    }
}

impl GroupStore for InMemoryGroupStore {
    fn find(&self, key: &str) -> Result<Option<EntityGroup>, PortalError> {
        let groups = self.groups.lock().unwrap_or_else(|e| e.into_inner());
        Ok(groups.get(key).cloned())
    }

    fn containing_groups(&self, member_key: &str) -> Result<Vec<EntityGroup>, PortalError> {
        let groups = self.groups.lock().unwrap_or_else(|e| e.into_inner());
        let mut containing: Vec<EntityGroup> = groups
            .values()
            .filter(|g| g.members.iter().any(|m| m == member_key))
            .cloned()
            .collect();
        containing.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(containing)
    }

    fn new_group(&self, kind: EntityKind) -> Result<EntityGroup, PortalError> {
        let group = EntityGroup {
            key: format!("{}:{}", kind.name(), Uuid::new_v4()),
            name: String::new(),
            members: Vec::new(),
        };
        self.put_group(group.clone());
        Ok(group)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct GroupStoreDocument {
    groups: Vec<EntityGroup>,
}

/// Read-only group store loaded from a JSON document of the form
/// `{"groups": [{"key": ..., "name": ..., "members": [...]}]}`.
pub struct JsonFileGroupStore {
    groups: HashMap<String, EntityGroup>,
}

impl JsonFileGroupStore {
    /// Loads and indexes the store document at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::Groups`] when the file cannot be read or does
    /// not parse as a store document.
    pub fn load(path: &Path) -> Result<Self, PortalError> {
        let raw = std::fs::read_to_string(path)?;
        let document: GroupStoreDocument = serde_json::from_str(&raw)?;
        let mut groups = HashMap::with_capacity(document.groups.len());
        for group in document.groups {
            groups.insert(group.key.clone(), group);
        }
        info!(
            path = %path.display(),
            group_count = groups.len(),
            "loaded json group store"
        );
        Ok(Self { groups })
    }
}

impl GroupStore for JsonFileGroupStore {
    fn find(&self, key: &str) -> Result<Option<EntityGroup>, PortalError> {
        Ok(self.groups.get(key).cloned())
    }

    fn containing_groups(&self, member_key: &str) -> Result<Vec<EntityGroup>, PortalError> {
        let mut containing: Vec<EntityGroup> = self
            .groups
            .values()
            .filter(|g| g.members.iter().any(|m| m == member_key))
            .cloned()
            .collect();
        containing.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(containing)
    }

    fn new_group(&self, _kind: EntityKind) -> Result<EntityGroup, PortalError> {
        Err(PortalError::Groups(
            "json-file group store is read-only".to_string(),
        ))
    }
}
