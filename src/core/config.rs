use std::collections::{HashMap, HashSet};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::errors::PortalError;

/// The closed set of group store backends. Selection is configuration
/// driven; there is no reflective lookup of store implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupStoreKind {
    #[default]
    InMemory,
    JsonFile,
}

impl FromStr for GroupStoreKind {
    type Err = PortalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in-memory" => Ok(GroupStoreKind::InMemory),
            "json-file" => Ok(GroupStoreKind::JsonFile),
            other => Err(PortalError::Config(format!(
                "unknown group store '{other}', expected 'in-memory' or 'json-file'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PortalConfig {
    pub group_store: GroupStoreKind,
    pub group_store_path: Option<PathBuf>,
    /// Logical name -> group key, for distinguished-group lookups.
    pub distinguished_groups: HashMap<String, String>,
    pub group_includes: HashSet<String>,
    pub group_excludes: HashSet<String>,
    pub attribute_includes: HashSet<String>,
    pub attribute_excludes: HashSet<String>,
}

impl PortalConfig {
    /// Reads configuration from the environment. Every setting has a
    /// default; only an unrecognized group store name is an error.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::Config`] for an unknown `PORTAL_GROUP_STORE`
    /// value.
    pub fn from_env() -> Result<Self, PortalError> {
        let group_store = match env::var("PORTAL_GROUP_STORE") {
            Ok(name) => name.parse()?,
            Err(_) => GroupStoreKind::default(),
        };

        Ok(Self {
            group_store,
            group_store_path: env::var("PORTAL_GROUP_STORE_PATH").ok().map(PathBuf::from),
            distinguished_groups: parse_pairs(env::var("PORTAL_DISTINGUISHED_GROUPS").ok()),
            group_includes: parse_set(env::var("PORTAL_EVENT_GROUP_INCLUDES").ok()),
            group_excludes: parse_set(env::var("PORTAL_EVENT_GROUP_EXCLUDES").ok()),
            attribute_includes: parse_set(env::var("PORTAL_EVENT_ATTRIBUTE_INCLUDES").ok()),
            attribute_excludes: parse_set(env::var("PORTAL_EVENT_ATTRIBUTE_EXCLUDES").ok()),
        })
    }
}

// Comma-separated list, e.g. "admins,staff".
fn parse_set(raw: Option<String>) -> HashSet<String> {
    raw.map(|value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .collect()
    })
    .unwrap_or_default()
}

// Comma-separated name=key pairs, e.g. "everyone=local.0,person=local.1".
fn parse_pairs(raw: Option<String>) -> HashMap<String, String> {
    raw.map(|value| {
        value
            .split(',')
            .filter_map(|pair| {
                let (name, key) = pair.split_once('=')?;
                let name = name.trim();
                let key = key.trim();
                if name.is_empty() || key.is_empty() {
                    return None;
                }
                Some((name.to_string(), key.to_string()))
            })
            .collect()
    })
    .unwrap_or_default()
}
