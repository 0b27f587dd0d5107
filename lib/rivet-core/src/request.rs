//! Outbound request building.
//!
//! A [`RequestBuilder`] is the mutable binding context threaded through the
//! binder chain. [`RequestBuilder::build`] freezes it into a [`Request`],
//! which has no mutators; filters re-open a copy with [`Request::to_builder`].
//!
//! # Example
//!
//! ```
//! use rivet_core::{Method, Request};
//!
//! let request = Request::builder(Method::Head, "https://storage.example.com/v1/AUTH_a".parse().unwrap())
//!     .header("Accept", "*/*")
//!     .query("format", "json")
//!     .build();
//! assert_eq!(request.header("accept"), Some("*/*"));
//! ```

use bytes::Bytes;

use crate::{BindingError, Body, ContentType, Headers, Method};

/// A frozen outbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: Method,
    url: url::Url,
    headers: Headers,
    body: Option<Body>,
}

impl Request {
    /// Start building a request.
    #[must_use]
    pub fn builder(method: Method, url: url::Url) -> RequestBuilder {
        RequestBuilder::new(method, url)
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Request URL.
    #[must_use]
    pub const fn url(&self) -> &url::Url {
        &self.url
    }

    /// Request headers.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.headers
    }

    /// First header value by name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Request body.
    #[must_use]
    pub const fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    /// Body bytes, or an empty slice when there is no body.
    #[must_use]
    pub fn body_bytes(&self) -> &[u8] {
        match &self.body {
            Some(body) => body.bytes(),
            None => &[],
        }
    }

    /// Re-open a copy of this request for modification.
    #[must_use]
    pub fn to_builder(&self) -> RequestBuilder {
        self.clone().into_builder()
    }

    /// Re-open this request for modification.
    #[must_use]
    pub fn into_builder(self) -> RequestBuilder {
        RequestBuilder {
            method: self.method,
            url: self.url,
            headers: self.headers,
            body: self.body,
        }
    }

    /// Split into method, URL, headers and body.
    #[must_use]
    pub fn into_parts(self) -> (Method, url::Url, Headers, Option<Body>) {
        (self.method, self.url, self.headers, self.body)
    }
}

/// A request under construction.
///
/// Binders and filters receive and return it by value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestBuilder {
    method: Method,
    url: url::Url,
    headers: Headers,
    body: Option<Body>,
}

impl RequestBuilder {
    /// Empty headers, no body.
    #[must_use]
    pub fn new(method: Method, url: url::Url) -> Self {
        Self {
            method,
            url,
            headers: Headers::new(),
            body: None,
        }
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Target URL so far.
    #[must_use]
    pub const fn url(&self) -> &url::Url {
        &self.url
    }

    /// Headers so far. Later binders may depend on what earlier ones set.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Body so far.
    #[must_use]
    pub const fn body_ref(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    /// Sets a header, replacing existing values.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Appends a header value, keeping existing values.
    #[must_use]
    pub fn append_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Appends multiple header values.
    #[must_use]
    pub fn headers_from(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Removes every value of a header.
    #[must_use]
    pub fn remove_header(mut self, name: &str) -> Self {
        self.headers.remove(name);
        self
    }

    /// Append one query pair.
    #[must_use]
    pub fn query(mut self, name: &str, value: &str) -> Self {
        self.url.query_pairs_mut().append_pair(name, value);
        self
    }

    /// Append query pairs in order.
    #[must_use]
    pub fn query_pairs(mut self, pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        {
            let mut query = self.url.query_pairs_mut();
            for (name, value) in pairs {
                query.append_pair(&name, &value);
            }
        }
        self
    }

    /// Replaces the body and sets `Content-Type` accordingly.
    #[must_use]
    pub fn body(mut self, body: Body) -> Self {
        self.headers
            .insert("Content-Type", body.content_type().as_str());
        self.body = Some(body);
        self
    }

    /// Replaces the body with raw bytes of the given content type.
    #[must_use]
    pub fn bytes(self, content_type: ContentType, bytes: impl Into<Bytes>) -> Self {
        self.body(Body::new(content_type, bytes))
    }

    /// Set a JSON body.
    pub fn json<T: serde::Serialize>(self, value: &T) -> Result<Self, BindingError> {
        let bytes = crate::to_json(value)?;
        Ok(self.bytes(ContentType::Json, bytes))
    }

    /// Serialize `value` as an `application/x-www-form-urlencoded` body.
    pub fn form<T: serde::Serialize>(self, value: &T) -> Result<Self, BindingError> {
        let bytes = crate::to_form(value)?;
        Ok(self.bytes(ContentType::FormUrlEncoded, bytes))
    }

    /// Freeze into a [`Request`].
    #[must_use]
    pub fn build(self) -> Request {
        Request {
            method: self.method,
            url: self.url,
            headers: self.headers,
            body: self.body,
        }
    }
}
