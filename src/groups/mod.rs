//! Group membership service.
//!
//! Entry point into the groups system: callers obtain groups and entities by
//! key and navigate containment from there. The backing store is one of a
//! closed set of implementations selected through [`PortalConfig`] at
//! construction time; the service itself is plain injected state with no
//! process-wide singleton.

pub mod store;

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::config::{GroupStoreKind, PortalConfig};
use crate::errors::PortalError;
use store::{GroupStore, InMemoryGroupStore, JsonFileGroupStore};

/// The kinds of portal entities the groups system tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Person,
    Group,
    Portlet,
}

impl EntityKind {
    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Person => "person",
            EntityKind::Group => "group",
            EntityKind::Portlet => "portlet",
        }
    }
}

/// A leaf portal entity. Holding one does not guarantee the entity exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub key: String,
    pub kind: EntityKind,
}

/// A named group with member keys (entities or nested groups).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityGroup {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub members: Vec<String>,
}

/// Either a group or a leaf entity, as returned by member lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupMember {
    Group(EntityGroup),
    Entity(Entity),
}

impl GroupMember {
    pub fn key(&self) -> &str {
        match self {
            GroupMember::Group(group) => &group.key,
            GroupMember::Entity(entity) => &entity.key,
        }
    }
}

/// Group membership lookups over a configured store.
pub struct GroupService {
    store: Arc<dyn GroupStore>,
    distinguished: HashMap<String, String>,
}

impl GroupService {
    #[must_use]
    pub fn new(store: Arc<dyn GroupStore>, distinguished: HashMap<String, String>) -> Self {
        Self {
            store,
            distinguished,
        }
    }

    /// Builds the service with the store named in the configuration. The set
    /// of store implementations is closed; there is no runtime class loading.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::Config`] when the JSON-file store is selected
    /// without a path, or [`PortalError::Groups`] when the store document
    /// cannot be loaded.
    pub fn from_config(config: &PortalConfig) -> Result<Self, PortalError> {
        let store: Arc<dyn GroupStore> = match config.group_store {
            GroupStoreKind::InMemory => Arc::new(InMemoryGroupStore::new()),
            GroupStoreKind::JsonFile => {
                let path = config.group_store_path.as_ref().ok_or_else(|| {
                    PortalError::Config(
                        "group store 'json-file' requires a store path".to_string(),
                    )
                })?;
                Arc::new(JsonFileGroupStore::load(path)?)
            }
        };
        Ok(Self::new(store, config.distinguished_groups.clone()))
    }

    /// Returns a pre-existing group, or `None` if no group has this key.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::Groups`] if the store lookup fails.
    pub fn find_group(&self, key: &str) -> Result<Option<EntityGroup>, PortalError> {
        self.store.find(key)
    }

    /// Returns an entity handle for a portal entity. Existence is not
    /// checked.
    #[must_use]
    pub fn get_entity(&self, key: &str, kind: EntityKind) -> Entity {
        Entity {
            key: key.to_string(),
            kind,
        }
    }

    /// Returns the member for `key`: a group when `kind` is
    /// [`EntityKind::Group`], otherwise a leaf entity.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::Groups`] if the store lookup fails.
    pub fn get_group_member(
        &self,
        key: &str,
        kind: EntityKind,
    ) -> Result<Option<GroupMember>, PortalError> {
        if kind == EntityKind::Group {
            Ok(self.find_group(key)?.map(GroupMember::Group))
        } else {
            Ok(Some(GroupMember::Entity(self.get_entity(key, kind))))
        }
    }

    /// Looks up a well-known group by its configured logical name.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::Groups`] when no key is configured for the
    /// name or the configured key matches no group.
    pub fn distinguished_group(&self, name: &str) -> Result<EntityGroup, PortalError> {
        let key = self.distinguished.get(name).ok_or_else(|| {
            PortalError::Groups(format!(
                "no key configured for distinguished group '{name}'"
            ))
        })?;
        self.find_group(key)?.ok_or_else(|| {
            PortalError::Groups(format!(
                "distinguished group '{name}' points at missing group key '{key}'"
            ))
        })
    }

    /// The root group for an entity kind, configured under the kind's name.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`GroupService::distinguished_group`].
    pub fn root_group(&self, kind: EntityKind) -> Result<EntityGroup, PortalError> {
        self.distinguished_group(kind.name())
    }

    /// Creates a new empty group with an unused key.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::Groups`] if the store is read-only or the
    /// insert fails.
    pub fn new_group(&self, kind: EntityKind) -> Result<EntityGroup, PortalError> {
        self.store.new_group(kind)
    }

    /// Keys of every group containing `member_key`, directly or through
    /// nesting, in discovery order without duplicates.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::Groups`] if a store lookup fails.
    pub fn all_containing_group_keys(&self, member_key: &str) -> Result<Vec<String>, PortalError> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut keys = Vec::new();
        let mut frontier: VecDeque<String> = VecDeque::new();
        frontier.push_back(member_key.to_string());

        while let Some(current) = frontier.pop_front() {
            for group in self.store.containing_groups(&current)? {
                if seen.insert(group.key.clone()) {
                    keys.push(group.key.clone());
                    frontier.push_back(group.key);
                }
            }
        }

        Ok(keys)
    }

    pub fn group_store(&self) -> &Arc<dyn GroupStore> {
        &self.store
    }
}
