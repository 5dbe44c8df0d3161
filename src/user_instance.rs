//! Per-session user instances and shared guest preference state.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::identity::Identity;
use crate::session::Session;

/// Preference state shared by every session belonging to the same guest id.
///
/// One manager exists per distinct guest id for the lifetime of the owning
/// `UserInstanceManager`; sessions bind to it on guest-instance creation and
/// unbind on session teardown.
#[derive(Debug, Default)]
pub struct GuestUserPreferencesManager {
    preferences: Mutex<HashMap<String, String>>,
    bound_sessions: AtomicUsize,
}

impl GuestUserPreferencesManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn preference(&self, name: &str) -> Option<String> {
        let preferences = self.preferences.lock().unwrap_or_else(|e| e.into_inner());
        preferences.get(name).cloned()
    }

    pub fn set_preference(&self, name: impl Into<String>, value: impl Into<String>) {
        let mut preferences = self.preferences.lock().unwrap_or_else(|e| e.into_inner());
        preferences.insert(name.into(), value.into());
    }

    /// Number of live sessions currently bound to this manager.
    pub fn bound_sessions(&self) -> usize {
        self.bound_sessions.load(Ordering::Acquire)
    }

    pub(crate) fn bind_session(&self) {
        self.bound_sessions.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn unbind_session(&self) {
        // Saturating: a duplicate destroy notification must not underflow.
        let _ = self
            .bound_sessions
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
    }
}

/// Discriminates the two user-instance variants.
#[derive(Debug)]
pub enum UserInstanceKind {
    Authenticated,
    Guest {
        preferences: Arc<GuestUserPreferencesManager>,
    },
}

/// The per-session handle to portal state for a resolved identity.
///
/// Created lazily by the instance manager on the first resolution for a
/// session and reused for every later request on that session.
#[derive(Debug)]
pub struct UserInstance {
    identity: Arc<Identity>,
    kind: UserInstanceKind,
    session_id: String,
    destroy_count: AtomicUsize,
}

impl UserInstance {
    pub(crate) fn authenticated(identity: Arc<Identity>, session_id: impl Into<String>) -> Self {
        Self {
            identity,
            kind: UserInstanceKind::Authenticated,
            session_id: session_id.into(),
            destroy_count: AtomicUsize::new(0),
        }
    }

    pub(crate) fn guest(
        identity: Arc<Identity>,
        preferences: Arc<GuestUserPreferencesManager>,
        session_id: impl Into<String>,
    ) -> Self {
        preferences.bind_session();
        Self {
            identity,
            kind: UserInstanceKind::Guest { preferences },
            session_id: session_id.into(),
            destroy_count: AtomicUsize::new(0),
        }
    }

    pub fn identity(&self) -> &Arc<Identity> {
        &self.identity
    }

    pub fn kind(&self) -> &UserInstanceKind {
        &self.kind
    }

    /// Shared guest preference manager, when this is a guest instance.
    pub fn guest_preferences(&self) -> Option<&Arc<GuestUserPreferencesManager>> {
        match &self.kind {
            UserInstanceKind::Guest { preferences } => Some(preferences),
            UserInstanceKind::Authenticated => None,
        }
    }

    /// Id of the session this instance is bound to.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Teardown hook invoked when the owning session is destroyed.
    ///
    /// Idempotent and infallible: a duplicate notification only logs. Any
    /// deeper cleanup failure stays inside the instance.
    pub fn destroy_session(&self, session: &Session) {
        let previous = self.destroy_count.fetch_add(1, Ordering::AcqRel);
        if previous > 0 {
            debug!(
                session_id = session.id(),
                "duplicate destroy notification for user instance"
            );
            return;
        }
        if let UserInstanceKind::Guest { preferences } = &self.kind {
            preferences.unbind_session();
        }
        debug!(
            session_id = session.id(),
            username = self.identity.username(),
            "user instance torn down"
        );
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroy_count.load(Ordering::Acquire) > 0
    }

    /// How many times the teardown hook has been invoked. Destruction work
    /// runs only on the first call.
    pub fn destroy_count(&self) -> usize {
        self.destroy_count.load(Ordering::Acquire)
    }
}

/// Durable record that a user instance was established on a session.
///
/// Only this marker survives session persistence; the live `Arc<UserInstance>`
/// is kept in the session's live-attribute map and is rebuilt by the next
/// resolution after a session is reattached.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserInstanceMarker {
    pub identity_id: i64,
    pub username: String,
    pub guest: bool,
}

impl UserInstanceMarker {
    #[must_use]
    pub fn for_identity(identity: &Identity) -> Self {
        Self {
            identity_id: identity.id(),
            username: identity.username().to_string(),
            guest: identity.is_guest(),
        }
    }
}
