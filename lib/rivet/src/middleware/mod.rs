//! Tower middleware layers for [`HyperTransport`](crate::HyperTransport).
//!
//! Layers wrap the raw hyper service and see every round trip, including
//! each retry issued by the dispatcher. The first layer added is the
//! outermost.
//!
//! - [`LoggingLayer`] - logs requests/responses using `tracing`
//! - [`ConcurrencyLimitLayer`] - limits concurrent round trips

mod logging;

pub use logging::{LogLevel, Logging, LoggingLayer};

pub use tower::limit::ConcurrencyLimitLayer;
pub use tower::{Layer, ServiceBuilder};
