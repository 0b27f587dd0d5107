//! Binder strategies: typed domain value in, request fragments out.
//!
//! A binder receives the [`RequestBuilder`] under construction and the
//! caller's value, and returns the updated builder or a [`BindingError`].
//! Binders run in declared order, do no I/O and keep no state between calls.
//!
//! Any `Fn(RequestBuilder, &I) -> Result<RequestBuilder, BindingError>` is a
//! binder:
//!
//! ```
//! use rivet_core::{Binder, BindingError, Method, Request, RequestBuilder};
//!
//! struct Metadata { color: String }
//!
//! let binder = |request: RequestBuilder, meta: &Metadata| -> Result<_, BindingError> {
//!     Ok(request.header("X-Container-Meta-Color", meta.color.as_str()))
//! };
//!
//! let base = Request::builder(Method::Post, "https://storage.example.com/c".parse().unwrap());
//! let request = binder.bind(base, &Metadata { color: "blue".into() }).unwrap().build();
//! assert_eq!(request.header("x-container-meta-color"), Some("blue"));
//! ```

use crate::{BindingError, ContentType, RequestBuilder, XmlElement};

/// Binds a domain value of type `I` onto an outbound request.
pub trait Binder<I>: Send + Sync {
    /// Produce the next request state from `request` and `input`.
    fn bind(&self, request: RequestBuilder, input: &I) -> Result<RequestBuilder, BindingError>;
}

impl<I, F> Binder<I> for F
where
    F: Fn(RequestBuilder, &I) -> Result<RequestBuilder, BindingError> + Send + Sync,
{
    fn bind(&self, request: RequestBuilder, input: &I) -> Result<RequestBuilder, BindingError> {
        self(request, input)
    }
}

/// Serializes the value as a JSON body.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBinder;

impl<I: serde::Serialize> Binder<I> for JsonBinder {
    fn bind(&self, request: RequestBuilder, input: &I) -> Result<RequestBuilder, BindingError> {
        request.json(input)
    }
}

/// Serializes the value as a form URL-encoded body.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormBinder;

impl<I: serde::Serialize> Binder<I> for FormBinder {
    fn bind(&self, request: RequestBuilder, input: &I) -> Result<RequestBuilder, BindingError> {
        request.form(input)
    }
}

/// Appends the value's fields to the query string.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryBinder;

impl<I: serde::Serialize> Binder<I> for QueryBinder {
    fn bind(&self, request: RequestBuilder, input: &I) -> Result<RequestBuilder, BindingError> {
        let query = crate::to_query_string(input)?;
        let pairs: Vec<(String, String)> = url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();
        Ok(request.query_pairs(pairs))
    }
}

/// Builds an XML body from a function producing the document root.
pub struct XmlBinder<F> {
    build: F,
}

impl<F> XmlBinder<F> {
    /// Wrap a document-building function.
    pub const fn new(build: F) -> Self {
        Self { build }
    }
}

impl<F> std::fmt::Debug for XmlBinder<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XmlBinder").finish_non_exhaustive()
    }
}

impl<I, F> Binder<I> for XmlBinder<F>
where
    F: Fn(&I) -> Result<XmlElement, BindingError> + Send + Sync,
{
    fn bind(&self, request: RequestBuilder, input: &I) -> Result<RequestBuilder, BindingError> {
        let root = (self.build)(input)?;
        Ok(request.bytes(ContentType::Xml, root.to_xml_string()))
    }
}

/// Returns the value, or [`BindingError::MissingField`] if it is empty.
///
/// Derived values must not silently fall back to a default.
pub fn require<'a>(field: &str, value: &'a str) -> Result<&'a str, BindingError> {
    if value.trim().is_empty() {
        Err(BindingError::missing_field(field))
    } else {
        Ok(value)
    }
}

/// Converts `UPPER_SNAKE` names to `UpperCamel` (`EXTRA_SMALL` → `ExtraSmall`).
///
/// Word boundaries are underscores only, so `A5` and `STANDARD_D1` become
/// `A5` and `StandardD1`.
#[must_use]
pub fn upper_camel(upper_snake: &str) -> String {
    upper_snake
        .split('_')
        .filter(|word| !word.is_empty())
        .flat_map(|word| {
            let mut chars = word.chars();
            chars
                .next()
                .map(|first| first.to_ascii_uppercase())
                .into_iter()
                .chain(chars.map(|c| c.to_ascii_lowercase()))
        })
        .collect()
}
