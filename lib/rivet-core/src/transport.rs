//! Transport contract.
//!
//! The transport performs one network round trip. It knows nothing about
//! operations, retries or sessions; the dispatcher owns those. Implement it
//! to plug in another HTTP stack or a scripted test double.

use std::future::Future;
use std::sync::Arc;

use crate::{Request, Response, TransportError};

/// Performs a single HTTP exchange.
pub trait Transport: Send + Sync {
    /// Send the request and return the response, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns an error only when no response was received:
    /// - connection failures
    /// - TLS errors
    /// - timeouts
    /// - requests that cannot be expressed on the wire
    fn send(&self, request: Request) -> impl Future<Output = Result<Response, TransportError>> + Send;
}

impl<T: Transport> Transport for Arc<T> {
    fn send(&self, request: Request) -> impl Future<Output = Result<Response, TransportError>> + Send {
        T::send(self, request)
    }
}
