//! Shared session token cache with coalesced refresh.
//!
//! The cache is the only mutable state shared by concurrent invocations. Its
//! mutex guards short critical sections only; the refresh round trip runs
//! outside it as a [`Shared`] future that every waiting caller polls.
//!
//! Callers pass the generation they observed before using the token. If a
//! newer token already exists it is returned, otherwise the caller joins the
//! in-flight refresh or starts one. N concurrent callers that saw the same
//! stale generation cause exactly one authenticator call.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tracing::{debug, info, warn};

use crate::{AuthenticationError, Authenticator, Credentials, SessionToken};

type RefreshFuture = Shared<BoxFuture<'static, Result<SessionToken, AuthenticationError>>>;

struct State {
    token: Option<SessionToken>,
    generation: u64,
    inflight: Option<RefreshFuture>,
}

struct Inner {
    authenticator: Arc<dyn Authenticator>,
    credentials: Credentials,
    auth_timeout: Duration,
    state: Mutex<State>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn complete(&self, result: &Result<SessionToken, AuthenticationError>) {
        let mut state = self.lock();
        state.inflight = None;
        if let Ok(token) = result {
            state.token = Some(token.clone());
            state.generation += 1;
            info!(generation = state.generation, "session refreshed");
        }
    }
}

/// Token and generation seen at one instant.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    token: Option<SessionToken>,
    generation: u64,
}

impl SessionSnapshot {
    /// The token, unless absent or expired.
    #[must_use]
    pub fn token(&self) -> Option<&SessionToken> {
        self.token.as_ref().filter(|token| !token.is_expired())
    }

    /// Generation counter, incremented on every successful refresh.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

/// Shared session credential cache.
///
/// Cloning is cheap; clones share the same token.
#[derive(Clone)]
pub struct SessionCache {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for SessionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("SessionCache")
            .field("identity", &self.inner.credentials.identity())
            .field("generation", &state.generation)
            .field("has_token", &state.token.is_some())
            .field("refreshing", &state.inflight.is_some())
            .finish_non_exhaustive()
    }
}

impl SessionCache {
    /// Create a cache with no token and default settings.
    #[must_use]
    pub fn new(authenticator: impl Authenticator + 'static, credentials: Credentials) -> Self {
        Self::builder(authenticator, credentials).build()
    }

    /// Create a new cache builder.
    #[must_use]
    pub fn builder(
        authenticator: impl Authenticator + 'static,
        credentials: Credentials,
    ) -> SessionCacheBuilder {
        SessionCacheBuilder {
            authenticator: Arc::new(authenticator),
            credentials,
            auth_timeout: Duration::from_secs(30),
            token: None,
        }
    }

    /// Current token and generation.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.inner.lock();
        SessionSnapshot {
            token: state.token.clone(),
            generation: state.generation,
        }
    }

    /// Current token, unless absent or expired.
    #[must_use]
    pub fn token(&self) -> Option<SessionToken> {
        self.snapshot().token().cloned()
    }

    /// Current generation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.inner.lock().generation
    }

    /// Obtain a token newer than `observed_generation`.
    ///
    /// The refresh future is owned by the cache, so cancelling a waiting
    /// caller does not abandon it: the next caller keeps driving it.
    ///
    /// # Errors
    ///
    /// Returns the authenticator's error, or [`AuthenticationError::Timeout`]
    /// when the round trip exceeds the configured timeout. Failures are
    /// shared by every caller waiting on the same refresh.
    pub async fn refresh(
        &self,
        observed_generation: u64,
    ) -> Result<SessionToken, AuthenticationError> {
        let refresh = {
            let mut state = self.inner.lock();
            if state.generation > observed_generation
                && let Some(token) = state.token.as_ref().filter(|token| !token.is_expired())
            {
                debug!(generation = state.generation, "reusing refreshed session");
                return Ok(token.clone());
            }
            if let Some(inflight) = &state.inflight {
                debug!("joining in-flight session refresh");
                inflight.clone()
            } else {
                let refresh = self.start_refresh(state.token.clone());
                state.inflight = Some(refresh.clone());
                refresh
            }
        };

        refresh.await
    }

    fn start_refresh(&self, previous: Option<SessionToken>) -> RefreshFuture {
        let inner = Arc::clone(&self.inner);
        debug!(identity = inner.credentials.identity(), "session refresh started");

        async move {
            let round_trip = async {
                match &previous {
                    Some(previous) => {
                        inner
                            .authenticator
                            .refresh(&inner.credentials, previous)
                            .await
                    }
                    None => inner.authenticator.login(&inner.credentials).await,
                }
            };
            let result = tokio::time::timeout(inner.auth_timeout, round_trip)
                .await
                .unwrap_or(Err(AuthenticationError::Timeout));

            if let Err(err) = &result {
                warn!(error = %err, "session refresh failed");
            }
            inner.complete(&result);
            result
        }
        .boxed()
        .shared()
    }
}

/// Builder for [`SessionCache`].
pub struct SessionCacheBuilder {
    authenticator: Arc<dyn Authenticator>,
    credentials: Credentials,
    auth_timeout: Duration,
    token: Option<SessionToken>,
}

impl std::fmt::Debug for SessionCacheBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCacheBuilder")
            .field("credentials", &self.credentials)
            .field("auth_timeout", &self.auth_timeout)
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

impl SessionCacheBuilder {
    /// Set the timeout for one login or refresh round trip.
    #[must_use]
    pub const fn auth_timeout(mut self, timeout: Duration) -> Self {
        self.auth_timeout = timeout;
        self
    }

    /// Seed the cache with an already obtained token.
    #[must_use]
    pub fn token(mut self, token: SessionToken) -> Self {
        self.token = Some(token);
        self
    }

    /// Build the cache.
    #[must_use]
    pub fn build(self) -> SessionCache {
        SessionCache {
            inner: Arc::new(Inner {
                authenticator: self.authenticator,
                credentials: self.credentials,
                auth_timeout: self.auth_timeout,
                state: Mutex::new(State {
                    token: self.token,
                    generation: 0,
                    inflight: None,
                }),
            }),
        }
    }
}
