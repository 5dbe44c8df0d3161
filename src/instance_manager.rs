//! The session-scoped identity cache.
//!
//! `UserInstanceManager` answers one question: which `UserInstance` belongs
//! to this request? It resolves the principal, finds the existing session,
//! and returns the session's cached instance, creating it on the first
//! resolution. Guests additionally share one `GuestUserPreferencesManager`
//! per stable guest id across all of their sessions.
//!
//! Concurrency: the guest-manager map is the only process-wide mutable state
//! and is guarded by a single mutex held just for the lookup-or-insert, never
//! across instance construction. Per-session state relies on the session's
//! attribute atomicity only; two concurrent first-requests on the *same*
//! session may both miss and the later store wins. That race is an accepted
//! limitation, not a protected critical section.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, error};

use crate::errors::PortalError;
use crate::identity::IdentityResolver;
use crate::request::PortalRequest;
use crate::session::{Session, SessionStore};
use crate::user_instance::{GuestUserPreferencesManager, UserInstance, UserInstanceMarker};

/// Session attribute under which the user instance lives. The durable map
/// holds the serializable marker, the live map the instance itself.
pub const USER_INSTANCE_ATTR: &str = "org.portal.user.UserInstance";

pub struct UserInstanceManager {
    identity_resolver: Arc<dyn IdentityResolver>,
    session_store: Arc<dyn SessionStore>,
    guest_managers: Mutex<HashMap<i64, Arc<GuestUserPreferencesManager>>>,
}

impl UserInstanceManager {
    #[must_use]
    pub fn new(
        identity_resolver: Arc<dyn IdentityResolver>,
        session_store: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            identity_resolver,
            session_store,
            guest_managers: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the user instance associated with the given request.
    ///
    /// The first resolution on a session creates the instance; every later
    /// resolution returns the same `Arc` until the session is destroyed.
    ///
    /// # Errors
    ///
    /// - [`PortalError::InvalidState`] if the request has no existing
    ///   session; resolution never creates sessions.
    /// - [`PortalError::Authentication`] if the identity resolver fails or
    ///   yields no identity, or if a non-guest principal is not actually
    ///   authenticated.
    pub fn resolve(&self, request: &PortalRequest) -> Result<Arc<UserInstance>, PortalError> {
        let request = request.canonical();

        let identity = match self.identity_resolver.resolve(request) {
            Ok(Some(identity)) => identity,
            Ok(None) => {
                return Err(PortalError::Authentication(
                    "identity resolver returned no identity for this request; \
                     with no principal there is no user instance, is the resolver misconfigured?"
                        .to_string(),
                ));
            }
            Err(e) => {
                error!("identity resolution failed: {e}");
                return Err(PortalError::Authentication(format!(
                    "could not resolve identity: {e}"
                )));
            }
        };

        let session = self.session_store.session(request).ok_or_else(|| {
            PortalError::InvalidState(
                "an existing session is required while resolving a user instance".to_string(),
            )
        })?;

        // Cache hit: the live holder already carries an instance.
        if let Some(existing) = Self::cached_instance(&session) {
            return Ok(existing);
        }

        let instance = if identity.is_guest() {
            let preferences = self.guest_preferences(identity.id());
            Arc::new(UserInstance::guest(identity.clone(), preferences, session.id()))
        } else {
            if !identity.security_context().is_authenticated() {
                return Err(PortalError::Authentication(
                    "System does not allow for unauthenticated non-guest users.".to_string(),
                ));
            }
            Arc::new(UserInstance::authenticated(identity.clone(), session.id()))
        };

        let marker = UserInstanceMarker::for_identity(&identity);
        match serde_json::to_value(&marker) {
            Ok(value) => session.set_durable_attribute(USER_INSTANCE_ATTR, value),
            // The marker is bookkeeping; the live instance is authoritative.
            Err(e) => error!("could not serialize user instance marker: {e}"),
        }
        session.set_live_attribute(USER_INSTANCE_ATTR, instance.clone());

        debug!(
            session_id = session.id(),
            username = identity.username(),
            guest = identity.is_guest(),
            "user instance created"
        );

        Ok(instance)
    }

    /// Session-destroyed hook. Tears down the session's user instance, if
    /// one was ever attached. Never fails; duplicate notifications no-op.
    pub fn on_session_destroyed(&self, session: &Session) {
        let Some(holder) = session.remove_live_attribute(USER_INSTANCE_ATTR) else {
            return;
        };
        session.remove_durable_attribute(USER_INSTANCE_ATTR);
        if let Ok(instance) = holder.downcast::<UserInstance>() {
            instance.destroy_session(session);
        }
    }

    /// Number of distinct guest ids with a live preferences manager.
    pub fn guest_manager_count(&self) -> usize {
        let managers = self.guest_managers.lock().unwrap_or_else(|e| e.into_inner());
        managers.len()
    }

    fn cached_instance(session: &Session) -> Option<Arc<UserInstance>> {
        let holder = session.live_attribute(USER_INSTANCE_ATTR)?;
        holder.downcast::<UserInstance>().ok()
    }

    // Lookup-or-insert of the shared per-guest preferences manager. The lock
    // covers only the check-and-insert so concurrent first-requests from the
    // same guest id cannot create duplicates.
    fn guest_preferences(&self, guest_id: i64) -> Arc<GuestUserPreferencesManager> {
        let mut managers = self.guest_managers.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(
            managers
                .entry(guest_id)
                .or_insert_with(|| Arc::new(GuestUserPreferencesManager::new())),
        )
    }
}
