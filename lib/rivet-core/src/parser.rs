//! Parser strategies: inbound response in, typed domain value out.
//!
//! Parsers only see responses the dispatcher already classified as
//! success-eligible. Headers-only parsers must never read the body; body
//! parsers take it once.

use std::marker::PhantomData;

use crate::{ParsingError, Response};

/// Turns a response into a value of type `O`.
pub trait ResponseParser<O>: Send + Sync {
    /// Parse the response.
    fn parse(&self, response: Response) -> Result<O, ParsingError>;
}

impl<O, F> ResponseParser<O> for F
where
    F: Fn(Response) -> Result<O, ParsingError> + Send + Sync,
{
    fn parse(&self, response: Response) -> Result<O, ParsingError> {
        self(response)
    }
}

/// Parser for operations without a result value.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusOnly;

impl ResponseParser<()> for StatusOnly {
    fn parse(&self, _response: Response) -> Result<(), ParsingError> {
        Ok(())
    }
}

/// Deserializes a JSON body into `T`.
pub struct JsonParser<T> {
    _target: PhantomData<fn() -> T>,
}

impl<T> JsonParser<T> {
    /// Creates a JSON parser.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _target: PhantomData,
        }
    }
}

impl<T> Default for JsonParser<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for JsonParser<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("JsonParser")
    }
}

impl<T: serde::de::DeserializeOwned> ResponseParser<T> for JsonParser<T> {
    fn parse(&self, response: Response) -> Result<T, ParsingError> {
        response.json()
    }
}

/// Returns the body as UTF-8 text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextParser;

impl ResponseParser<String> for TextParser {
    fn parse(&self, response: Response) -> Result<String, ParsingError> {
        response.text()
    }
}
