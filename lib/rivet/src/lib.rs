//! Declarative HTTP API client for Rust.
//!
//! Operations are declared once as [`OperationDescriptor`]s: method, path
//! template, binders, filters, parser and status mappings. The
//! [`Dispatcher`] turns a typed invocation into a request, sends it through
//! a [`Transport`], and turns the response back into a typed result,
//! renewing sessions and retrying transport failures within bounds.
//!
//! # Example
//!
//! ```ignore
//! use rivet::prelude::*;
//! use rivet::filters::SessionHeaderFilter;
//!
//! pub const GET_COUNT: OperationId<(), u64> = OperationId::new("storage.count.get");
//!
//! let registry = Registry::new().with(
//!     OperationDescriptor::builder(GET_COUNT, Method::Head, "/")
//!         .filter(SessionHeaderFilter::new("X-Auth-Token", session.clone()))
//!         .parser(|response: Response| response.parse_header("X-Count"))
//!         .on_status(401, StatusMapping::SessionExpired)
//!         .build()?,
//! )?;
//!
//! let dispatcher = Dispatcher::builder(HyperTransport::new(), base_url)
//!     .registry(registry)
//!     .session(session)
//!     .build();
//!
//! let count = dispatcher.invoke(&GET_COUNT, &()).await?;
//! ```

mod config;
mod connector;
mod dispatcher;
pub mod filters;
pub mod middleware;
pub mod mock;
pub mod prelude;
mod session;
mod transport;

pub use config::{
    DispatcherConfig, DispatcherConfigBuilder, TransportConfig, TransportConfigBuilder,
};
pub use connector::{https_connector, webpki_root_store};
pub use dispatcher::{Dispatcher, DispatcherBuilder};
pub use session::{SessionCache, SessionCacheBuilder, SessionSnapshot};
pub use transport::{BoxedService, HyperTransport, HyperTransportBuilder, ServiceFuture};

// Re-export tower for middleware composition
pub use tower;

// Re-export core types
pub use rivet_core::{
    AuthFuture, AuthenticationError, Authenticator, Binder, BindingError, Body, ContentType,
    Credentials, DescriptorError, Error, FormBinder, Headers, JsonBinder, JsonParser, Method,
    OperationDescriptor, OperationDescriptorBuilder, OperationId, ParsingError, PathArgs,
    PathTemplate, QueryBinder, Registry, Request, RequestBuilder, RequestFilter, Response,
    ResponseParser, Result, SessionToken, StatusMapping, StatusOnly, TextParser, Transport,
    TransportError, XmlBinder, XmlElement, apply_filters, from_json, require, to_form, to_json,
    to_query_string, upper_camel,
};

// Re-export url for descriptor and dispatcher construction
pub use url;
