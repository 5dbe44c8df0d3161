//! Server-side sessions and the session store.
//!
//! A session is an opaque per-client bucket of named attributes. Attributes
//! come in two flavors with deliberately different lifetimes:
//!
//! - *durable* attributes are plain JSON values and are the only part of a
//!   session that survives persistence;
//! - *live* attributes hold in-memory handles (`Arc<dyn Any>`) that are never
//!   persisted and are reconstructed on demand after a session is reattached.
//!
//! Each map is behind its own mutex, so individual get/set/remove calls are
//! atomic but no cross-attribute transaction is offered.

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::request::PortalRequest;

pub type LiveAttribute = Arc<dyn Any + Send + Sync>;

/// A per-client server-side state bucket spanning multiple requests.
pub struct Session {
    id: String,
    durable: Mutex<HashMap<String, Value>>,
    live: Mutex<HashMap<String, LiveAttribute>>,
    destroyed: AtomicBool,
}

impl Session {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            durable: Mutex::new(HashMap::new()),
            live: Mutex::new(HashMap::new()),
            destroyed: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn durable_attribute(&self, name: &str) -> Option<Value> {
        let durable = self.durable.lock().unwrap_or_else(|e| e.into_inner());
        durable.get(name).cloned()
    }

    pub fn set_durable_attribute(&self, name: impl Into<String>, value: Value) {
        let mut durable = self.durable.lock().unwrap_or_else(|e| e.into_inner());
        durable.insert(name.into(), value);
    }

    pub fn remove_durable_attribute(&self, name: &str) -> Option<Value> {
        let mut durable = self.durable.lock().unwrap_or_else(|e| e.into_inner());
        durable.remove(name)
    }

    /// Runs `f` while holding the durable-attribute lock. This is the
    /// session-scoped mutex used when an attribute must be created at most
    /// once per session (check and insert under one lock).
    pub fn with_durable_attributes<T>(&self, f: impl FnOnce(&mut HashMap<String, Value>) -> T) -> T {
        let mut durable = self.durable.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut durable)
    }

    pub fn live_attribute(&self, name: &str) -> Option<LiveAttribute> {
        let live = self.live.lock().unwrap_or_else(|e| e.into_inner());
        live.get(name).cloned()
    }

    pub fn set_live_attribute(&self, name: impl Into<String>, value: LiveAttribute) {
        let mut live = self.live.lock().unwrap_or_else(|e| e.into_inner());
        live.insert(name.into(), value);
    }

    pub fn remove_live_attribute(&self, name: &str) -> Option<LiveAttribute> {
        let mut live = self.live.lock().unwrap_or_else(|e| e.into_inner());
        live.remove(name)
    }

    /// The view of this session that would be written out by a persistent
    /// session store: id plus durable attributes only.
    #[must_use]
    pub fn serializable_snapshot(&self) -> Value {
        let durable = self.durable.lock().unwrap_or_else(|e| e.into_inner());
        serde_json::json!({
            "id": self.id,
            "attributes": durable.clone(),
        })
    }

    /// Rebuilds a session from a persisted snapshot. Live attributes start
    /// empty; whatever they referenced is reconstructed on demand.
    pub fn from_snapshot(snapshot: &Value) -> Option<Self> {
        let id = snapshot.get("id")?.as_str()?;
        let session = Session::new(id);
        if let Some(attributes) = snapshot.get("attributes").and_then(Value::as_object) {
            let mut durable = session.durable.lock().unwrap_or_else(|e| e.into_inner());
            for (name, value) in attributes {
                durable.insert(name.clone(), value.clone());
            }
        }
        Some(session)
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    pub(crate) fn mark_destroyed(&self) {
        self.destroyed.store(true, Ordering::Release);
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("destroyed", &self.is_destroyed())
            .finish_non_exhaustive()
    }
}

/// Maps requests to their existing sessions. Never creates a session as a
/// side effect of a lookup.
pub trait SessionStore: Send + Sync {
    fn session(&self, request: &PortalRequest) -> Option<Arc<Session>>;
}

/// Session store backed by an in-process map keyed by session token.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<String, Arc<Session>>>,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates and registers a session for the given token, returning the
    /// shared handle. Replaces any previous session under the same token.
    pub fn create_session(&self, token: impl Into<String>) -> Arc<Session> {
        let token = token.into();
        let session = Arc::new(Session::new(token.clone()));
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.insert(token, Arc::clone(&session));
        session
    }

    /// Forgets the session for `token` and returns it so the caller can fire
    /// the session-destroyed notification.
    pub fn destroy_session(&self, token: &str) -> Option<Arc<Session>> {
        let removed = {
            let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
            sessions.remove(token)
        };
        if let Some(session) = &removed {
            session.mark_destroyed();
        }
        removed
    }
}

impl SessionStore for InMemorySessionStore {
    fn session(&self, request: &PortalRequest) -> Option<Arc<Session>> {
        let token = request.canonical().session_token()?;
        let sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.get(token).cloned()
    }
}
