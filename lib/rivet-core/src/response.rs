//! Inbound response handling.
//!
//! Headers can be read any number of times; the body is single-pass. A parser
//! that needs both reads the headers first and takes the body last.
//!
//! # Example
//!
//! ```
//! use rivet_core::{Headers, Response};
//!
//! let headers: Headers = [("X-Account-Object-Count", "12")].into_iter().collect();
//! let response = Response::new(204, headers, "");
//! let objects: u64 = response.parse_header("x-account-object-count").unwrap();
//! assert_eq!(objects, 12);
//! ```

use std::str::FromStr;

use bytes::Bytes;

use crate::{Headers, ParsingError};

/// Response with status, headers, and a body readable once.
#[derive(Debug)]
pub struct Response {
    status: u16,
    headers: Headers,
    body: Option<Bytes>,
}

impl Response {
    /// Creates a new response.
    #[must_use]
    pub fn new(status: u16, headers: Headers, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: Some(body.into()),
        }
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Response headers.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.headers
    }

    /// First header value by name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Header value, failing with [`ParsingError::MissingHeader`] when absent.
    pub fn required_header(&self, name: &str) -> Result<&str, ParsingError> {
        self.header(name)
            .ok_or_else(|| ParsingError::MissingHeader(name.to_string()))
    }

    /// Parse a required header value.
    pub fn parse_header<T>(&self, name: &str) -> Result<T, ParsingError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let value = self.required_header(name)?;
        value
            .trim()
            .parse()
            .map_err(|e: T::Err| ParsingError::invalid_header(name, value, e.to_string()))
    }

    /// Parse an optional header value; absent yields `None`, malformed fails.
    pub fn parse_optional_header<T>(&self, name: &str) -> Result<Option<T>, ParsingError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.header(name) {
            Some(_) => self.parse_header(name).map(Some),
            None => Ok(None),
        }
    }

    /// Headers whose name starts with `prefix` (ASCII case-insensitive),
    /// with the prefix stripped and the remainder lowercased.
    pub fn headers_with_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (String, &'a str)> + 'a {
        self.headers.iter().filter_map(move |(name, value)| {
            let head = name.get(..prefix.len())?;
            head.eq_ignore_ascii_case(prefix).then(|| {
                let key = name.get(prefix.len()..).unwrap_or_default();
                (key.to_ascii_lowercase(), value)
            })
        })
    }

    /// Status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Status is 4xx.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        self.status >= 400 && self.status < 500
    }

    /// Status is 5xx.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        self.status >= 500 && self.status < 600
    }

    /// Take the body. A second call fails with [`ParsingError::BodyConsumed`].
    pub fn take_body(&mut self) -> Result<Bytes, ParsingError> {
        self.body.take().ok_or(ParsingError::BodyConsumed)
    }

    /// Consume into the body.
    pub fn into_body(mut self) -> Result<Bytes, ParsingError> {
        self.take_body()
    }

    /// Consume into (status, headers, body); the body is `None` if it was taken.
    #[must_use]
    pub fn into_parts(self) -> (u16, Headers, Option<Bytes>) {
        (self.status, self.headers, self.body)
    }

    /// Deserialize the body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(self) -> Result<T, ParsingError> {
        let body = self.into_body()?;
        crate::from_json(&body)
    }

    /// Get the body as text.
    pub fn text(self) -> Result<String, ParsingError> {
        let body = self.into_body()?;
        String::from_utf8(body.to_vec()).map_err(|_| ParsingError::InvalidUtf8)
    }
}
