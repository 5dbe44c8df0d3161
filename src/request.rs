//! Inbound portal requests.
//!
//! Portlet plumbing may hand the portal a wrapped view of the original
//! request; `canonical` recovers the underlying request before any session
//! or identity work happens.

/// An inbound request as seen by the portal.
#[derive(Debug, Default)]
pub struct PortalRequest {
    session_token: Option<String>,
    remote_addr: Option<String>,
    wrapped: Option<Box<PortalRequest>>,
}

impl PortalRequest {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    #[must_use]
    pub fn with_remote_addr(mut self, addr: impl Into<String>) -> Self {
        self.remote_addr = Some(addr.into());
        self
    }

    /// Wraps an existing request, as portlet containers do before dispatch.
    #[must_use]
    pub fn wrapping(inner: PortalRequest) -> Self {
        Self {
            session_token: None,
            remote_addr: None,
            wrapped: Some(Box::new(inner)),
        }
    }

    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref()
    }

    pub fn remote_addr(&self) -> Option<&str> {
        self.remote_addr.as_deref()
    }

    /// Returns the canonical underlying request, unwinding any number of
    /// wrapper layers. Identity function for an unwrapped request.
    #[must_use]
    pub fn canonical(&self) -> &PortalRequest {
        let mut request = self;
        while let Some(inner) = request.wrapped.as_deref() {
            request = inner;
        }
        request
    }
}
