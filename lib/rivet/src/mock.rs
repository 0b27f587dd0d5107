//! In-memory transport for tests.
//!
//! [`MockTransport`] replays scripted replies in order and records every
//! request it receives. When the script runs dry it falls back to a handler,
//! or fails with a connection error.
//!
//! ```
//! use rivet::mock::MockTransport;
//! use rivet::{Method, Request, Transport};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let transport = MockTransport::new().respond(204, &[("X-Count", "7")], "");
//! let request = Request::builder(Method::Head, "https://storage.example.com/".parse().unwrap()).build();
//!
//! let response = transport.send(request).await.unwrap();
//! assert_eq!(response.header("x-count"), Some("7"));
//! assert_eq!(transport.requests().len(), 1);
//! # }
//! ```

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use bytes::Bytes;

use crate::{Headers, Request, Response, Transport, TransportError};

type Handler = Arc<dyn Fn(&Request) -> Result<Response, TransportError> + Send + Sync>;

struct Reply {
    delay: Duration,
    outcome: Result<Response, TransportError>,
}

#[derive(Default)]
struct State {
    replies: VecDeque<Reply>,
    requests: Vec<Request>,
    handler: Option<Handler>,
}

/// Scripted transport recording requests.
///
/// Clones share the script and the recorded requests.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<State>>,
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("MockTransport")
            .field("pending_replies", &state.replies.len())
            .field("recorded_requests", &state.requests.len())
            .field("has_handler", &state.handler.is_some())
            .finish()
    }
}

impl MockTransport {
    /// Create a transport with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(self, delay: Duration, outcome: Result<Response, TransportError>) -> Self {
        self.lock().replies.push_back(Reply { delay, outcome });
        self
    }

    /// Queue a response.
    #[must_use]
    pub fn respond(self, status: u16, headers: &[(&str, &str)], body: impl Into<Bytes>) -> Self {
        let headers: Headers = headers.iter().copied().collect();
        self.push(Duration::ZERO, Ok(Response::new(status, headers, body)))
    }

    /// Queue a response delivered after `delay`.
    #[must_use]
    pub fn respond_after(self, delay: Duration, response: Response) -> Self {
        self.push(delay, Ok(response))
    }

    /// Queue a transport failure.
    #[must_use]
    pub fn fail(self, error: TransportError) -> Self {
        self.push(Duration::ZERO, Err(error))
    }

    /// Answer with `handler` once the script is exhausted.
    #[must_use]
    pub fn otherwise<F>(self, handler: F) -> Self
    where
        F: Fn(&Request) -> Result<Response, TransportError> + Send + Sync + 'static,
    {
        self.lock().handler = Some(Arc::new(handler));
        self
    }

    /// Every request received so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<Request> {
        self.lock().requests.clone()
    }

    /// Number of scripted replies not yet consumed.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.lock().replies.len()
    }

    fn next_reply(&self, request: &Request) -> Reply {
        let mut state = self.lock();
        state.requests.push(request.clone());
        if let Some(reply) = state.replies.pop_front() {
            return reply;
        }
        let outcome = match &state.handler {
            Some(handler) => handler(request),
            None => Err(TransportError::connection("no scripted reply")),
        };
        Reply {
            delay: Duration::ZERO,
            outcome,
        }
    }
}

impl Transport for MockTransport {
    fn send(&self, request: Request) -> impl Future<Output = Result<Response, TransportError>> + Send {
        let reply = self.next_reply(&request);
        async move {
            if !reply.delay.is_zero() {
                tokio::time::sleep(reply.delay).await;
            }
            reply.outcome
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Method;

    fn request(path: &str) -> Request {
        let url = url::Url::parse("https://api.example.com")
            .and_then(|base| base.join(path))
            .expect("valid URL");
        Request::builder(Method::Get, url).build()
    }

    #[tokio::test]
    async fn replays_script_then_handler() {
        let transport = MockTransport::new()
            .respond(200, &[], "first")
            .fail(TransportError::Timeout)
            .otherwise(|request| {
                Ok(Response::new(
                    200,
                    Headers::new(),
                    request.url().path().to_string(),
                ))
            });

        let first = transport.send(request("/a")).await.expect("scripted");
        assert_eq!(first.text().expect("text"), "first");

        let second = transport.send(request("/b")).await;
        assert!(matches!(second, Err(TransportError::Timeout)));

        let third = transport.send(request("/c")).await.expect("handler");
        assert_eq!(third.text().expect("text"), "/c");

        let paths: Vec<_> = transport
            .requests()
            .iter()
            .map(|request| request.url().path().to_string())
            .collect();
        assert_eq!(paths, ["/a", "/b", "/c"]);
        assert_eq!(transport.pending(), 0);
    }

    #[tokio::test]
    async fn empty_script_fails() {
        let err = MockTransport::new()
            .send(request("/"))
            .await
            .expect_err("no reply");
        assert!(err.is_retryable());
    }
}
