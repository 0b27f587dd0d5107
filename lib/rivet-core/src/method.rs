//! HTTP method types.

use std::str::FromStr;

use derive_more::Display;

use crate::TransportError;

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Method {
    /// `GET`.
    #[display("GET")]
    Get,
    /// `POST`. Not idempotent.
    #[display("POST")]
    Post,
    /// `PUT`.
    #[display("PUT")]
    Put,
    /// `DELETE`.
    #[display("DELETE")]
    Delete,
    /// `PATCH`. Not idempotent.
    #[display("PATCH")]
    Patch,
    /// `HEAD`, for header-only responses.
    #[display("HEAD")]
    Head,
    /// `OPTIONS`.
    #[display("OPTIONS")]
    Options,
}

impl Method {
    /// The method token as sent on the wire.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }

    /// Returns `true` if repeating the request has the same effect as sending it once.
    ///
    /// The dispatcher only retries transport failures for idempotent operations,
    /// and uses this as the default when a descriptor does not override it.
    #[must_use]
    pub const fn is_idempotent(&self) -> bool {
        matches!(
            self,
            Self::Get | Self::Head | Self::Options | Self::Put | Self::Delete
        )
    }
}

impl FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            "PATCH" => Ok(Self::Patch),
            "HEAD" => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            other => Err(format!("unsupported HTTP method: {other}")),
        }
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => Self::GET,
            Method::Post => Self::POST,
            Method::Put => Self::PUT,
            Method::Delete => Self::DELETE,
            Method::Patch => Self::PATCH,
            Method::Head => Self::HEAD,
            Method::Options => Self::OPTIONS,
        }
    }
}

impl TryFrom<http::Method> for Method {
    type Error = TransportError;

    fn try_from(method: http::Method) -> Result<Self, Self::Error> {
        method
            .as_str()
            .parse()
            .map_err(TransportError::InvalidRequest)
    }
}
