//! Session credentials and the authenticator contract.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

use crate::AuthenticationError;

/// Future returned by [`Authenticator`] methods.
pub type AuthFuture<'a> =
    Pin<Box<dyn Future<Output = Result<SessionToken, AuthenticationError>> + Send + 'a>>;

/// Identity and secret used to open a session.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    identity: String,
    secret: String,
}

impl Credentials {
    /// Creates credentials.
    #[must_use]
    pub fn new(identity: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            secret: secret.into(),
        }
    }

    /// User, account or key identity.
    #[must_use]
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Password or key secret.
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("identity", &self.identity)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Opaque session token with an optional expiry.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken {
    value: String,
    expires_at: Option<Instant>,
}

impl SessionToken {
    /// A token without known expiry.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            expires_at: None,
        }
    }

    /// Sets the instant after which the token is considered expired.
    #[must_use]
    pub const fn with_expiry(mut self, expires_at: Instant) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Sets the expiry relative to now.
    #[must_use]
    pub fn expires_in(self, ttl: Duration) -> Self {
        self.with_expiry(Instant::now() + ttl)
    }

    /// Token value as sent on the wire.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Expiry instant, if known.
    #[must_use]
    pub const fn expires_at(&self) -> Option<Instant> {
        self.expires_at
    }

    /// Returns `true` once the expiry instant has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|expires_at| Instant::now() >= expires_at)
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionToken")
            .field("value", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Obtains session tokens from an authentication endpoint.
///
/// Methods return boxed futures so authenticators can be shared as
/// `Arc<dyn Authenticator>`.
pub trait Authenticator: Send + Sync {
    /// Open a new session.
    fn login<'a>(&'a self, credentials: &'a Credentials) -> AuthFuture<'a>;

    /// Renew a session. Defaults to a fresh login.
    fn refresh<'a>(
        &'a self,
        credentials: &'a Credentials,
        _previous: &'a SessionToken,
    ) -> AuthFuture<'a> {
        self.login(credentials)
    }
}
