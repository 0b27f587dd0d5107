//! Error types for rivet.
//!
//! Each pipeline stage has its own error enum. [`Error`] wraps them without
//! erasing the kind, so callers can always match on the root cause.

use bytes::Bytes;
use derive_more::{Display, Error, From};

// ============================================================================
// Stage Errors
// ============================================================================

/// A domain value could not be encoded into a request.
///
/// Binding errors are programmer or caller errors and are never retried.
#[derive(Debug, Display, Error)]
pub enum BindingError {
    /// A field required to build the request is absent or empty.
    #[display("missing required field `{_0}`")]
    MissingField(#[error(not(source))] String),

    /// A path template placeholder has no value.
    #[display("missing path parameter `{_0}`")]
    MissingPathParam(#[error(not(source))] String),

    /// A discriminant value has no matching wire variant.
    #[display("unsupported variant `{value}` for `{field}`")]
    UnsupportedVariant {
        /// Discriminant field name.
        field: String,
        /// The value that could not be mapped.
        value: String,
    },

    /// A field is present but cannot be encoded.
    #[display("invalid value for `{field}`: {message}")]
    InvalidValue {
        /// Field name.
        field: String,
        /// Why the value was rejected.
        message: String,
    },

    /// JSON serialization failed.
    #[display("JSON serialization error: {_0}")]
    Json(serde_json::Error),

    /// Form or query string serialization failed.
    #[display("form serialization error: {_0}")]
    Form(serde_html_form::ser::Error),
}

impl BindingError {
    /// Create a missing field error.
    #[must_use]
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField(field.into())
    }

    /// Create an unsupported variant error.
    #[must_use]
    pub fn unsupported_variant(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::UnsupportedVariant {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create an invalid value error.
    #[must_use]
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// A response could not be turned into the declared result.
#[derive(Debug, Display, Error)]
pub enum ParsingError {
    /// A required header is absent.
    #[display("missing header `{_0}`")]
    MissingHeader(#[error(not(source))] String),

    /// A header value has the wrong shape.
    #[display("invalid header `{name}` value `{value}`: {message}")]
    InvalidHeader {
        /// Header name.
        name: String,
        /// Raw header value.
        value: String,
        /// Why it was rejected.
        message: String,
    },

    /// JSON deserialization error with path context.
    #[display("JSON deserialization error at '{path}': {message}")]
    Json {
        /// JSON path to the error (e.g., "account.quota.bytes").
        path: String,
        /// Error message.
        message: String,
    },

    /// The body is not valid UTF-8.
    #[display("response body is not valid UTF-8")]
    InvalidUtf8,

    /// The body was already read.
    #[display("response body already consumed")]
    BodyConsumed,

    /// The body is required but absent or otherwise unusable.
    #[display("malformed response: {_0}")]
    Malformed(#[error(not(source))] String),
}

impl ParsingError {
    /// Create a JSON deserialization error with path context.
    #[must_use]
    pub fn json(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Json {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an invalid header error.
    #[must_use]
    pub fn invalid_header(
        name: impl Into<String>,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidHeader {
            name: name.into(),
            value: value.into(),
            message: message.into(),
        }
    }
}

/// Authentication failed or the session must be renewed.
///
/// `Clone` because a single refresh result is shared by every caller that
/// waited on it.
#[derive(Debug, Clone, Display, Error, PartialEq, Eq)]
pub enum AuthenticationError {
    /// The session token is missing, expired or was rejected by the server.
    ///
    /// This is the only recoverable variant: the dispatcher re-authenticates
    /// and rebuilds the request.
    #[display("session expired: {_0}")]
    SessionExpired(#[error(not(source))] String),

    /// Credentials were refused by the authentication endpoint.
    #[display("invalid credentials: {_0}")]
    InvalidCredentials(#[error(not(source))] String),

    /// The authentication endpoint answered with an unexpected status.
    #[display("authentication rejected with status {status}")]
    Rejected {
        /// HTTP status code.
        status: u16,
    },

    /// The re-authentication round trip did not finish in time.
    #[display("authentication timeout")]
    Timeout,

    /// A request could not be signed.
    #[display("request signing failed: {_0}")]
    Signing(#[error(not(source))] String),

    /// The authentication round trip failed at the transport level.
    #[display("authentication transport error: {_0}")]
    Transport(#[error(not(source))] String),
}

impl AuthenticationError {
    /// Create a session expired error.
    #[must_use]
    pub fn session_expired(message: impl Into<String>) -> Self {
        Self::SessionExpired(message.into())
    }

    /// Returns `true` if refreshing the credential may fix the failure.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::SessionExpired(_))
    }
}

/// Connection-level failure reported by the transport.
#[derive(Debug, Display, Error)]
pub enum TransportError {
    /// Network/connection errors.
    #[display("connection error: {_0}")]
    Connection(#[error(not(source))] String),

    /// The round trip did not finish in time.
    #[display("request timeout")]
    Timeout,

    /// TLS/SSL errors.
    #[display("TLS error: {_0}")]
    Tls(#[error(not(source))] String),

    /// The request cannot be expressed on the wire.
    #[display("invalid request: {_0}")]
    InvalidRequest(#[error(not(source))] String),
}

impl TransportError {
    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Returns `true` if sending the same request again may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout)
    }
}

/// An operation descriptor or registry is misconfigured.
#[derive(Debug, Display, Error)]
pub enum DescriptorError {
    /// A descriptor with a result type declares no parser.
    #[display("operation `{_0}` declares no response parser")]
    MissingParser(#[error(not(source))] String),

    /// Two descriptors share one identity.
    #[display("operation `{_0}` is registered twice")]
    DuplicateOperation(#[error(not(source))] String),

    /// The path template is malformed.
    #[display("invalid path template `{template}`: {message}")]
    InvalidPathTemplate {
        /// The template as declared.
        template: String,
        /// What is wrong with it.
        message: String,
    },
}

// ============================================================================
// Error Type
// ============================================================================

/// Main error type returned by an invocation.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// The arguments could not be bound.
    #[display("binding error: {_0}")]
    Binding(BindingError),

    /// Authentication failed or the session could not be renewed.
    #[display("authentication error: {_0}")]
    Authentication(AuthenticationError),

    /// The transport failed after all allowed attempts.
    #[display("transport error: {_0}")]
    Transport(TransportError),

    /// The response does not match the declared contract.
    #[display("parsing error: {_0}")]
    Parsing(ParsingError),

    /// A status code that no mapping of the operation expects.
    #[display("unexpected status {status} for `{operation}`")]
    #[from(skip)]
    Protocol {
        /// Operation identity.
        operation: &'static str,
        /// HTTP status code.
        status: u16,
        /// Response body, if available.
        #[error(not(source))]
        body: Option<Bytes>,
    },

    /// The operation maps the status to "resource absent".
    #[display("not found ({status}) for `{operation}`")]
    #[from(skip)]
    NotFound {
        /// Operation identity.
        operation: &'static str,
        /// HTTP status code.
        status: u16,
        /// Response body, if available.
        #[error(not(source))]
        body: Option<Bytes>,
    },

    /// The operation maps the status to a state conflict.
    #[display("conflict ({status}) for `{operation}`")]
    #[from(skip)]
    Conflict {
        /// Operation identity.
        operation: &'static str,
        /// HTTP status code.
        status: u16,
        /// Response body, if available.
        #[error(not(source))]
        body: Option<Bytes>,
    },

    /// The operation maps the status to "caller lacks permission".
    #[display("access denied ({status}) for `{operation}`")]
    #[from(skip)]
    AccessDenied {
        /// Operation identity.
        operation: &'static str,
        /// HTTP status code.
        status: u16,
        /// Response body, if available.
        #[error(not(source))]
        body: Option<Bytes>,
    },

    /// No descriptor is registered under the identity.
    #[display("unknown operation `{_0}`")]
    #[from(skip)]
    UnknownOperation(#[error(not(source))] String),

    /// A descriptor or the registry is misconfigured.
    #[display("descriptor error: {_0}")]
    Descriptor(DescriptorError),
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns `true` if this is a transport timeout.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(TransportError::Timeout))
    }

    /// Returns `true` if this is a mapped "not found" error.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns the HTTP status code for status-derived errors.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Protocol { status, .. }
            | Self::NotFound { status, .. }
            | Self::Conflict { status, .. }
            | Self::AccessDenied { status, .. }
            | Self::Authentication(AuthenticationError::Rejected { status }) => Some(*status),
            _ => None,
        }
    }

    /// Returns the response body for status-derived errors.
    #[must_use]
    pub fn body(&self) -> Option<&Bytes> {
        match self {
            Self::Protocol { body, .. }
            | Self::NotFound { body, .. }
            | Self::Conflict { body, .. }
            | Self::AccessDenied { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    /// Try to decode the error body as JSON.
    ///
    /// Returns `None` if there is no body or this is not a status-derived error.
    pub fn decode_body<T: serde::de::DeserializeOwned>(
        &self,
    ) -> Option<std::result::Result<T, ParsingError>> {
        self.body().map(|body| crate::from_json(body))
    }
}
