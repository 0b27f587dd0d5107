//! Bearer token authentication filter.

use std::fmt;
use std::sync::Arc;

use crate::{AuthenticationError, Request, RequestFilter, SessionCache};

#[derive(Clone)]
enum TokenSource {
    Static(Arc<str>),
    Session(SessionCache),
}

/// Sets `Authorization: Bearer <token>`.
///
/// The token is either fixed or read from a [`SessionCache`] on every
/// application. A missing or expired session token is reported as
/// [`AuthenticationError::SessionExpired`].
#[derive(Clone)]
pub struct BearerTokenFilter {
    source: TokenSource,
}

impl BearerTokenFilter {
    /// Create a filter with a fixed token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            source: TokenSource::Static(Arc::from(token.into())),
        }
    }

    /// Create a filter reading the token from a session cache.
    #[must_use]
    pub const fn from_session(cache: SessionCache) -> Self {
        Self {
            source: TokenSource::Session(cache),
        }
    }
}

impl fmt::Debug for BearerTokenFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match &self.source {
            TokenSource::Static(_) => "static",
            TokenSource::Session(_) => "session",
        };
        f.debug_struct("BearerTokenFilter")
            .field("source", &source)
            .finish()
    }
}

impl RequestFilter for BearerTokenFilter {
    fn apply(&self, request: Request) -> Result<Request, AuthenticationError> {
        let value = match &self.source {
            TokenSource::Static(token) => format!("Bearer {token}"),
            TokenSource::Session(cache) => {
                let token = cache
                    .token()
                    .ok_or_else(|| AuthenticationError::session_expired("no valid bearer token"))?;
                format!("Bearer {}", token.value())
            }
        };

        Ok(request
            .into_builder()
            .header("Authorization", value)
            .build())
    }
}
