//! Portal event creation and publication.
//!
//! Login and logout events carry a per-session event-session id plus a
//! flattened view of the principal: containing group keys and person
//! attributes, both run through configurable include/exclude sets.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::core::config::PortalConfig;
use crate::errors::PortalError;
use crate::groups::GroupService;
use crate::identity::Identity;
use crate::session::Session;
use crate::utils::filters::included;

/// Durable session attribute holding the generated event session id.
pub const EVENT_SESSION_ID_ATTR: &str = "org.portal.events.EVENT_SESSION_ID";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PortalEvent {
    Login {
        event_session_id: String,
        username: String,
        groups: Vec<String>,
        attributes: BTreeMap<String, Vec<String>>,
        timestamp: DateTime<Utc>,
    },
    Logout {
        event_session_id: String,
        username: String,
        timestamp: DateTime<Utc>,
    },
}

impl PortalEvent {
    pub fn event_session_id(&self) -> &str {
        match self {
            PortalEvent::Login {
                event_session_id, ..
            }
            | PortalEvent::Logout {
                event_session_id, ..
            } => event_session_id,
        }
    }
}

/// Sink for created portal events.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: PortalEvent);
}

/// Publisher that keeps every event in memory, for tests and local runs.
#[derive(Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<PortalEvent>>,
}

impl RecordingPublisher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PortalEvent> {
        let events = self.events.lock().unwrap_or_else(|e| e.into_inner());
        events.clone()
    }
}

impl EventPublisher for RecordingPublisher {
    fn publish(&self, event: PortalEvent) {
        let mut events = self.events.lock().unwrap_or_else(|e| e.into_inner());
        events.push(event);
    }
}

/// Creates and publishes login/logout events for resolved principals.
pub struct PortalEventFactory {
    group_service: Arc<GroupService>,
    publisher: Arc<dyn EventPublisher>,
    group_includes: HashSet<String>,
    group_excludes: HashSet<String>,
    attribute_includes: HashSet<String>,
    attribute_excludes: HashSet<String>,
}

impl PortalEventFactory {
    #[must_use]
    pub fn new(
        config: &PortalConfig,
        group_service: Arc<GroupService>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            group_service,
            publisher,
            group_includes: config.group_includes.clone(),
            group_excludes: config.group_excludes.clone(),
            attribute_includes: config.attribute_includes.clone(),
            attribute_excludes: config.attribute_excludes.clone(),
        }
    }

    /// Builds a login event for the principal on the given session.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::Groups`] if the containing-group lookup fails.
    pub fn create_login_event(
        &self,
        session: &Session,
        identity: &Identity,
    ) -> Result<PortalEvent, PortalError> {
        let event_session_id = self.event_session_id(session, identity);
        let groups = self.groups_for(identity)?;
        let attributes = self.attributes_for(identity);
        Ok(PortalEvent::Login {
            event_session_id,
            username: identity.username().to_string(),
            groups,
            attributes,
            timestamp: Utc::now(),
        })
    }

    /// Creates and publishes a login event.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`PortalEventFactory::create_login_event`].
    pub fn publish_login_event(
        &self,
        session: &Session,
        identity: &Identity,
    ) -> Result<(), PortalError> {
        let event = self.create_login_event(session, identity)?;
        self.publisher.publish(event);
        Ok(())
    }

    #[must_use]
    pub fn create_logout_event(&self, session: &Session, identity: &Identity) -> PortalEvent {
        PortalEvent::Logout {
            event_session_id: self.event_session_id(session, identity),
            username: identity.username().to_string(),
            timestamp: Utc::now(),
        }
    }

    pub fn publish_logout_event(&self, session: &Session, identity: &Identity) {
        let event = self.create_logout_event(session, identity);
        self.publisher.publish(event);
    }

    /// Returns the session's event-session id, generating it on first use.
    ///
    /// Generation happens under the session's durable-attribute lock so only
    /// one id can ever exist per session, whatever the request concurrency.
    pub fn event_session_id(&self, session: &Session, identity: &Identity) -> String {
        session.with_durable_attributes(|attributes| {
            if let Some(existing) = attributes
                .get(EVENT_SESSION_ID_ATTR)
                .and_then(Value::as_str)
            {
                return existing.to_string();
            }

            let token = URL_SAFE_NO_PAD.encode(Uuid::new_v4().as_bytes());
            let event_session_id = format!(
                "{}_{}_{}",
                Utc::now().timestamp_millis(),
                identity.username(),
                token
            );
            attributes.insert(
                EVENT_SESSION_ID_ATTR.to_string(),
                Value::String(event_session_id.clone()),
            );

            info!("Generated portal event session id: {event_session_id}");

            event_session_id
        })
    }

    // Containing group keys, filtered, discovery order, no duplicates.
    fn groups_for(&self, identity: &Identity) -> Result<Vec<String>, PortalError> {
        let keys = self
            .group_service
            .all_containing_group_keys(&identity.entity_key())?;
        Ok(keys
            .into_iter()
            .filter(|key| included(key, &self.group_includes, &self.group_excludes))
            .collect())
    }

    // Person attributes flattened to strings. Scalar values (strings,
    // numbers, booleans) are kept; structured values are dropped.
    fn attributes_for(&self, identity: &Identity) -> BTreeMap<String, Vec<String>> {
        let mut flattened = BTreeMap::new();
        for (name, values) in identity.attributes() {
            if !included(name, &self.attribute_includes, &self.attribute_excludes) {
                continue;
            }
            let strings: Vec<String> = values
                .iter()
                .filter_map(|value| match value {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    Value::Bool(b) => Some(b.to_string()),
                    _ => None,
                })
                .collect();
            flattened.insert(name.clone(), strings);
        }
        flattened
    }
}
