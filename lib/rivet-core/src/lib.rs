//! Core types and traits for the rivet declarative HTTP API client.
//!
//! This crate provides the pieces an operation is declared with:
//! - [`Request`], [`RequestBuilder`], [`Response`] and [`Headers`] - the wire message model
//! - [`Binder`] - typed domain value to request fragments
//! - [`ResponseParser`] - response to typed domain value
//! - [`RequestFilter`] - request augmentation before dispatch
//! - [`Transport`] and [`Authenticator`] - external collaborators
//! - [`OperationDescriptor`], [`OperationId`] and [`Registry`] - the declarative operation table
//! - [`XmlElement`] - order-preserving XML trees for hand-built payloads
//! - [`Error`] and [`Result`] - error handling
//!
//! The dispatcher that executes descriptors lives in the `rivet` crate.

mod auth;
mod binder;
mod body;
mod error;
mod filter;
mod headers;
mod method;
mod operation;
mod parser;
mod path_template;
pub mod prelude;
mod request;
mod response;
mod transport;
mod xml;

pub use auth::{AuthFuture, Authenticator, Credentials, SessionToken};
pub use binder::{Binder, FormBinder, JsonBinder, QueryBinder, XmlBinder, require, upper_camel};
pub use body::{Body, ContentType, from_json, to_form, to_json, to_query_string};
pub use error::{
    AuthenticationError, BindingError, DescriptorError, Error, ParsingError, Result,
    TransportError,
};
pub use filter::{RequestFilter, apply_filters};
pub use headers::Headers;
pub use method::Method;
pub use operation::{
    OperationDescriptor, OperationDescriptorBuilder, OperationId, Registry, StatusMapping,
};
pub use parser::{JsonParser, ResponseParser, StatusOnly, TextParser};
pub use path_template::{PathArgs, PathTemplate};
pub use request::{Request, RequestBuilder};
pub use response::Response;
pub use transport::Transport;
pub use xml::XmlElement;
