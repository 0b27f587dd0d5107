//! Transport-level request/response logging.
//!
//! Logs each round trip using the `tracing` crate. At debug level headers are
//! logged too, with credential-bearing values redacted.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use tower::{Layer, Service};
use tracing::{Instrument, Level, debug, info, span, warn};

use crate::{Headers, Request, Response, TransportError};

const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "proxy-authorization",
    "cookie",
    "set-cookie",
    "x-auth-token",
    "x-vcloud-authorization",
];

/// Wraps a transport service with `tracing` round-trip logs.
///
/// # Example
///
/// ```ignore
/// use rivet::HyperTransport;
/// use rivet::middleware::LoggingLayer;
///
/// let transport = HyperTransport::builder()
///     .layer(LoggingLayer::debug())
///     .build();
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingLayer {
    level: LogLevel,
}

/// How much [`Logging`] records.
#[derive(Debug, Clone, Copy, Default)]
pub enum LogLevel {
    /// Headers too, with credentials redacted.
    Debug,
    /// Method, URL, status and elapsed time.
    #[default]
    Info,
}

impl LoggingLayer {
    /// Info-level logging.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Debug-level logging, headers included.
    #[must_use]
    pub fn debug() -> Self {
        Self {
            level: LogLevel::Debug,
        }
    }
}

impl<S> Layer<S> for LoggingLayer {
    type Service = Logging<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Logging {
            inner,
            level: self.level,
        }
    }
}

/// Transport service produced by [`LoggingLayer`].
#[derive(Debug, Clone)]
pub struct Logging<S> {
    inner: S,
    level: LogLevel,
}

fn redacted(headers: &Headers) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let shown = if SENSITIVE_HEADERS
                .iter()
                .any(|sensitive| name.eq_ignore_ascii_case(sensitive))
            {
                "[REDACTED]"
            } else {
                value
            };
            (name.to_string(), shown.to_string())
        })
        .collect()
}

impl<S> Service<Request> for Logging<S>
where
    S: Service<Request, Response = Response, Error = TransportError> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = TransportError;
    type Future = Pin<Box<dyn Future<Output = Result<Response, TransportError>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), TransportError>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let method = request.method();
        let url = request.url().to_string();
        let level = self.level;

        let span = span!(Level::INFO, "http_request", %method, %url);

        let mut inner = self.inner.clone();
        Box::pin(
            async move {
                let start = Instant::now();

                match level {
                    LogLevel::Debug => {
                        debug!(
                            headers = ?redacted(request.headers()),
                            body_len = request.body_bytes().len(),
                            "sending request"
                        );
                    }
                    LogLevel::Info => info!("sending request"),
                }

                let result = inner.call(request).await;
                let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

                match &result {
                    Ok(response) => {
                        let status = response.status();
                        if let LogLevel::Debug = level {
                            debug!(status, headers = ?redacted(response.headers()), "response headers");
                        }
                        if response.is_success() {
                            info!(status, elapsed_ms, "request completed");
                        } else {
                            warn!(status, elapsed_ms, "request completed with HTTP error");
                        }
                    }
                    Err(err) => warn!(error = %err, elapsed_ms, "request failed"),
                }

                result
            }
            .instrument(span),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logging_layer_levels() {
        assert!(matches!(LoggingLayer::new().level, LogLevel::Info));
        assert!(matches!(LoggingLayer::debug().level, LogLevel::Debug));
    }

    #[test]
    fn credentials_are_redacted() {
        let headers: Headers = [
            ("Authorization", "Basic YWRtaW46c2VjcmV0"),
            ("X-Auth-Token", "AUTH_tk123"),
            ("Accept", "application/json"),
        ]
        .into_iter()
        .collect();

        let shown = redacted(&headers);
        assert_eq!(
            shown,
            [
                ("Authorization".to_string(), "[REDACTED]".to_string()),
                ("X-Auth-Token".to_string(), "[REDACTED]".to_string()),
                ("Accept".to_string(), "application/json".to_string()),
            ]
        );
    }
}
