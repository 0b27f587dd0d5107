//! Prelude module for convenient imports.
//!
//! ```ignore
//! use rivet_core::prelude::*;
//! ```

pub use crate::{
    AuthenticationError, Binder, BindingError, ContentType, Error, Headers, Method,
    OperationDescriptor, OperationId, ParsingError, PathArgs, Request, RequestBuilder,
    RequestFilter, Response, ResponseParser, Result, StatusMapping, Transport, TransportError,
    XmlElement,
};
