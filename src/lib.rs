/// Portal Session - session-scoped identity cache for an enterprise portal.
///
/// This crate implements the request-facing identity layer of a portal:
/// it resolves the principal bound to an inbound request, returns the
/// per-session user instance (creating it exactly once per session), and
/// tears the instance down when the session is destroyed.
///
/// # Architecture
///
/// The system uses:
/// - `UserInstanceManager` as the single entry point (`resolve` plus the
///   `on_session_destroyed` lifecycle hook)
/// - injected collaborator traits for identity resolution and session lookup
/// - a shared `GuestUserPreferencesManager` per stable guest id
/// - a configuration-selected group store backing the group service
/// - portal login/logout events with group and attribute flattening
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use portal_session::identity::{FixedIdentityResolver, Identity};
/// use portal_session::instance_manager::UserInstanceManager;
/// use portal_session::request::PortalRequest;
/// use portal_session::session::InMemorySessionStore;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let sessions = Arc::new(InMemorySessionStore::new());
///     sessions.create_session("token-1");
///
///     let resolver = Arc::new(FixedIdentityResolver::new(
///         Identity::authenticated_user(7, "jdoe"),
///     ));
///     let manager = UserInstanceManager::new(resolver, sessions);
///
///     let request = PortalRequest::new().with_session_token("token-1");
///     let instance = manager.resolve(&request)?;
///     assert_eq!(instance.identity().username(), "jdoe");
///
///     // Later requests on the same session get the same instance.
///     let again = manager.resolve(&request)?;
///     assert!(Arc::ptr_eq(&instance, &again));
///     Ok(())
/// }
/// ```
// Module declarations
pub mod core;
pub mod errors;
pub mod events;
pub mod groups;
pub mod identity;
pub mod instance_manager;
pub mod portlet;
pub mod request;
pub mod session;
pub mod user_instance;
pub mod utils;

/// Configure structured logging with JSON format for server environments.
///
/// Sets up tracing-subscriber with a JSON formatter. Call once at process
/// start; embedding applications that already install a subscriber should
/// skip this.
pub fn setup_logging() {
    use tracing_subscriber::prelude::*;
    let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);

    tracing_subscriber::registry().with(fmt_layer).init();
}
