//! Prelude module for convenient imports.
//!
//! ```ignore
//! use rivet::prelude::*;
//! ```

pub use crate::{
    Authenticator, Binder, ContentType, Credentials, Dispatcher, DispatcherConfig, Error,
    HyperTransport, JsonBinder, JsonParser, Method, OperationDescriptor, OperationId, PathArgs,
    Registry, Request, RequestBuilder, RequestFilter, Response, ResponseParser, Result,
    SessionCache, SessionToken, StatusMapping, Transport, XmlElement,
};
