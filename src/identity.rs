//! Resolved principals and their security context.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::errors::PortalError;
use crate::request::PortalRequest;

/// Answers whether the principal actually completed authentication.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecurityContext {
    authenticated: bool,
}

impl SecurityContext {
    #[must_use]
    pub fn authenticated() -> Self {
        Self {
            authenticated: true,
        }
    }

    #[must_use]
    pub fn unauthenticated() -> Self {
        Self {
            authenticated: false,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }
}

/// The resolved principal for a request: either an authenticated user or an
/// anonymous guest with a stable numeric id.
#[derive(Debug, Clone)]
pub struct Identity {
    id: i64,
    username: String,
    guest: bool,
    security_context: SecurityContext,
    attributes: HashMap<String, Vec<Value>>,
}

impl Identity {
    #[must_use]
    pub fn authenticated_user(id: i64, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            guest: false,
            security_context: SecurityContext::authenticated(),
            attributes: HashMap::new(),
        }
    }

    /// A non-guest principal whose security context never completed
    /// authentication. The portal refuses to build user instances for these.
    #[must_use]
    pub fn unauthenticated_user(id: i64, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            guest: false,
            security_context: SecurityContext::unauthenticated(),
            attributes: HashMap::new(),
        }
    }

    /// An anonymous but trackable principal. Guests share portal state per
    /// stable numeric id, not per session.
    #[must_use]
    pub fn guest(id: i64) -> Self {
        Self {
            id,
            username: "guest".to_string(),
            guest: true,
            security_context: SecurityContext::unauthenticated(),
            attributes: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, values: Vec<Value>) -> Self {
        self.attributes.insert(name.into(), values);
        self
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn is_guest(&self) -> bool {
        self.guest
    }

    /// Key under which this principal appears in the groups system.
    #[must_use]
    pub fn entity_key(&self) -> String {
        format!("person.{}", self.id)
    }

    pub fn security_context(&self) -> &SecurityContext {
        &self.security_context
    }

    /// Raw person attributes as provided by the directory layer.
    pub fn attributes(&self) -> &HashMap<String, Vec<Value>> {
        &self.attributes
    }
}

/// Resolves the principal bound to a request.
///
/// Returning `Ok(None)` is treated by the instance manager as a resolver
/// misconfiguration, not as "anonymous": anonymous visitors are expected to
/// come back as guest identities.
pub trait IdentityResolver: Send + Sync {
    fn resolve(&self, request: &PortalRequest) -> Result<Option<Arc<Identity>>, PortalError>;
}

/// Resolver returning one fixed identity for every request. Useful for tests
/// and single-tenant embedding.
pub struct FixedIdentityResolver {
    identity: Option<Arc<Identity>>,
}

impl FixedIdentityResolver {
    #[must_use]
    pub fn new(identity: Identity) -> Self {
        Self {
            identity: Some(Arc::new(identity)),
        }
    }

    /// A resolver that yields no identity at all, as a misconfigured
    /// directory backend would.
    #[must_use]
    pub fn empty() -> Self {
        Self { identity: None }
    }
}

impl IdentityResolver for FixedIdentityResolver {
    fn resolve(&self, _request: &PortalRequest) -> Result<Option<Arc<Identity>>, PortalError> {
        Ok(self.identity.clone())
    }
}
