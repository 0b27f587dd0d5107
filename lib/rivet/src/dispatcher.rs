//! Invocation dispatcher.
//!
//! Executes one operation end to end:
//!
//! ```text
//! Building ──► Filtering ──► Dispatching ──► Parsing ──► Succeeded
//!    │  ▲          │  ▲           │                │
//!    │  └─reauth───┘  └──retry────┘                │
//!    └──────────────── Failed ◄────────────────────┘
//! ```
//!
//! - Building: path expansion and binders. Failures never reach the network.
//! - Filtering: the filter chain runs over a copy of the built request on
//!   every attempt. A recoverable authentication failure renews the session
//!   and restarts from Building, up to `max_auth_retries` times.
//! - Dispatching: one transport round trip bounded by `dispatch_timeout`.
//!   Connection failures and timeouts are retried with exponential backoff
//!   for idempotent operations only.
//! - Parsing: 2xx goes to the parser; other statuses go through the
//!   descriptor's status mappings, and unmapped ones are protocol errors.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{Instrument, debug, info, info_span, warn};

use crate::{
    AuthenticationError, DispatcherConfig, Error, OperationDescriptor, OperationId, PathArgs,
    Registry, Request, Response, Result, SessionCache, StatusMapping, Transport, TransportError,
    apply_filters,
};

struct Inner<T> {
    transport: T,
    base_url: url::Url,
    registry: Arc<Registry>,
    config: DispatcherConfig,
    session: Option<SessionCache>,
}

/// Runs operations from a [`Registry`] against one API endpoint.
///
/// Cloning is cheap; clones share the transport, registry and session.
///
/// # Example
///
/// ```ignore
/// use rivet::{Dispatcher, HyperTransport, PathArgs};
///
/// let dispatcher = Dispatcher::builder(HyperTransport::new(), base_url)
///     .registry(registry)
///     .session(session)
///     .build();
///
/// let account = dispatcher.invoke(&GET_ACCOUNT, &()).await?;
/// ```
pub struct Dispatcher<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Dispatcher<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Dispatcher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("base_url", &self.inner.base_url.as_str())
            .field("registry", &self.inner.registry)
            .field("config", &self.inner.config)
            .field("session", &self.inner.session)
            .finish_non_exhaustive()
    }
}

impl<T: Transport> Dispatcher<T> {
    /// Create a new dispatcher builder.
    #[must_use]
    pub fn builder(transport: T, base_url: url::Url) -> DispatcherBuilder<T> {
        DispatcherBuilder {
            transport,
            base_url,
            registry: Arc::new(Registry::new()),
            config: DispatcherConfig::default(),
            session: None,
        }
    }

    /// Base URL every operation path is joined onto.
    #[must_use]
    pub fn base_url(&self) -> &url::Url {
        &self.inner.base_url
    }

    /// The operation table.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// Dispatcher configuration.
    #[must_use]
    pub fn config(&self) -> &DispatcherConfig {
        &self.inner.config
    }

    /// The underlying transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.inner.transport
    }

    /// The session renewed on recoverable authentication failures.
    #[must_use]
    pub fn session(&self) -> Option<&SessionCache> {
        self.inner.session.as_ref()
    }

    /// Invoke an operation whose path has no placeholders.
    pub async fn invoke<I, O>(&self, id: &OperationId<I, O>, input: &I) -> Result<O>
    where
        I: 'static,
        O: 'static,
    {
        self.invoke_at(id, &PathArgs::new(), input).await
    }

    /// Invoke an operation, expanding its path template from `args`.
    ///
    /// Returns exactly one typed value or one typed error; partial results
    /// are never returned.
    pub async fn invoke_at<I, O>(
        &self,
        id: &OperationId<I, O>,
        args: &PathArgs,
        input: &I,
    ) -> Result<O>
    where
        I: 'static,
        O: 'static,
    {
        let descriptor = self.inner.registry.get(id)?;
        let span = info_span!(
            "invoke",
            operation = descriptor.name(),
            method = %descriptor.method()
        );

        async move {
            let start = Instant::now();
            let result = self.run(descriptor, args, input).await;
            let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

            match &result {
                Ok(_) => info!(elapsed_ms, "invocation succeeded"),
                Err(err) => warn!(elapsed_ms, error = %err, "invocation failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run<I, O>(
        &self,
        descriptor: &OperationDescriptor<I, O>,
        args: &PathArgs,
        input: &I,
    ) -> Result<O> {
        let mut auth_retries = 0;
        loop {
            let observed = self.inner.session.as_ref().map(SessionCache::generation);

            match self.attempt(descriptor, args, input).await {
                Err(Error::Authentication(err))
                    if err.is_recoverable()
                        && auth_retries < self.inner.config.max_auth_retries =>
                {
                    let (Some(session), Some(observed)) = (&self.inner.session, observed) else {
                        return Err(err.into());
                    };
                    auth_retries += 1;
                    warn!(attempt = auth_retries, reason = %err, "re-authenticating");
                    session.refresh(observed).await?;
                }
                outcome => return outcome,
            }
        }
    }

    /// Building, then the exchange, then classification.
    async fn attempt<I, O>(
        &self,
        descriptor: &OperationDescriptor<I, O>,
        args: &PathArgs,
        input: &I,
    ) -> Result<O> {
        let request = descriptor.build_request(&self.inner.base_url, args, input)?;
        debug!(url = %request.url(), "request built");

        let response = self.exchange(descriptor, &request).await?;
        Self::classify(descriptor, response)
    }

    /// Filtering and Dispatching, retried for idempotent operations.
    async fn exchange<I, O>(
        &self,
        descriptor: &OperationDescriptor<I, O>,
        request: &Request,
    ) -> Result<Response> {
        let config = &self.inner.config;
        let mut retry = 0;
        loop {
            let filtered = apply_filters(descriptor.filters(), request.clone())?;

            let outcome =
                tokio::time::timeout(config.dispatch_timeout, self.inner.transport.send(filtered))
                    .await
                    .unwrap_or(Err(TransportError::Timeout));

            match outcome {
                Ok(response) => {
                    debug!(status = response.status(), "response received");
                    return Ok(response);
                }
                Err(err)
                    if err.is_retryable()
                        && descriptor.is_idempotent()
                        && retry < config.max_transport_retries =>
                {
                    let delay = config.backoff(retry);
                    retry += 1;
                    warn!(
                        retry,
                        delay_ms = duration_ms(delay),
                        error = %err,
                        "transport failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    fn classify<I, O>(descriptor: &OperationDescriptor<I, O>, response: Response) -> Result<O> {
        if response.is_success() {
            return descriptor.parse(response).map_err(Error::from);
        }

        let operation = descriptor.name();
        let status = response.status();
        let (_, _, body) = response.into_parts();
        let body = body.filter(|body| !body.is_empty());

        Err(match descriptor.status_mapping(status) {
            Some(StatusMapping::NotFound) => Error::NotFound {
                operation,
                status,
                body,
            },
            Some(StatusMapping::Conflict) => Error::Conflict {
                operation,
                status,
                body,
            },
            Some(StatusMapping::AccessDenied) => Error::AccessDenied {
                operation,
                status,
                body,
            },
            Some(StatusMapping::SessionExpired) => Error::Authentication(
                AuthenticationError::session_expired(format!("server answered {status}")),
            ),
            None => Error::Protocol {
                operation,
                status,
                body,
            },
        })
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Builder for [`Dispatcher`].
pub struct DispatcherBuilder<T> {
    transport: T,
    base_url: url::Url,
    registry: Arc<Registry>,
    config: DispatcherConfig,
    session: Option<SessionCache>,
}

impl<T> fmt::Debug for DispatcherBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatcherBuilder")
            .field("base_url", &self.base_url.as_str())
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<T: Transport> DispatcherBuilder<T> {
    /// Set the operation table.
    #[must_use]
    pub fn registry(mut self, registry: impl Into<Arc<Registry>>) -> Self {
        self.registry = registry.into();
        self
    }

    /// Set the configuration.
    #[must_use]
    pub fn config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the session renewed on recoverable authentication failures.
    ///
    /// Without a session, those failures are surfaced as-is.
    #[must_use]
    pub fn session(mut self, session: SessionCache) -> Self {
        self.session = Some(session);
        self
    }

    /// Build the dispatcher.
    #[must_use]
    pub fn build(self) -> Dispatcher<T> {
        Dispatcher {
            inner: Arc::new(Inner {
                transport: self.transport,
                base_url: self.base_url,
                registry: self.registry,
                config: self.config,
                session: self.session,
            }),
        }
    }
}
