//! Body payloads and serialization utilities.

use bytes::Bytes;

use crate::{BindingError, ParsingError};

/// Content type for request bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// JSON content type (`application/json`).
    Json,
    /// XML content type (`application/xml`).
    Xml,
    /// Form URL-encoded content type (`application/x-www-form-urlencoded`).
    FormUrlEncoded,
    /// Plain text content type (`text/plain`).
    PlainText,
    /// Binary content type (`application/octet-stream`).
    OctetStream,
}

impl ContentType {
    /// Get the MIME type string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Xml => "application/xml",
            Self::FormUrlEncoded => "application/x-www-form-urlencoded",
            Self::PlainText => "text/plain",
            Self::OctetStream => "application/octet-stream",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An opaque payload together with its declared content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Body {
    content_type: ContentType,
    bytes: Bytes,
}

impl Body {
    /// Creates a body.
    #[must_use]
    pub fn new(content_type: ContentType, bytes: impl Into<Bytes>) -> Self {
        Self {
            content_type,
            bytes: bytes.into(),
        }
    }

    /// Declared content type.
    #[must_use]
    pub const fn content_type(&self) -> ContentType {
        self.content_type
    }

    /// Payload bytes.
    #[must_use]
    pub const fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// Consume into the payload bytes.
    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }
}

/// Serialize a value to JSON bytes.
///
/// # Example
///
/// ```
/// use rivet_core::to_json;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Container { name: String }
///
/// let container = Container { name: "logs".to_string() };
/// let bytes = to_json(&container).expect("serialize");
/// assert_eq!(bytes.as_ref(), br#"{"name":"logs"}"#);
/// ```
pub fn to_json<T: serde::Serialize>(value: &T) -> Result<Bytes, BindingError> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(BindingError::Json)
}

/// Serialize a value to form URL-encoded bytes.
///
/// Sequences become repeated fields (`tags=a&tags=b`).
///
/// # Example
///
/// ```
/// use rivet_core::to_form;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct TokenRequest { grant_type: &'static str, scope: &'static str }
///
/// let form = TokenRequest { grant_type: "client_credentials", scope: "storage" };
/// let bytes = to_form(&form).expect("serialize");
/// assert_eq!(bytes.as_ref(), b"grant_type=client_credentials&scope=storage");
/// ```
pub fn to_form<T: serde::Serialize>(value: &T) -> Result<Bytes, BindingError> {
    serde_html_form::to_string(value)
        .map(|s| Bytes::from(s.into_bytes()))
        .map_err(BindingError::Form)
}

/// Serialize a value to a query string.
pub fn to_query_string<T: serde::Serialize>(value: &T) -> Result<String, BindingError> {
    serde_html_form::to_string(value).map_err(BindingError::Form)
}

/// Deserialize JSON bytes to a value with path-aware error messages.
///
/// Unknown fields are ignored unless the target type denies them; missing
/// required fields fail with the path to the offending field.
///
/// # Example
///
/// ```
/// use rivet_core::from_json;
/// use serde::Deserialize;
///
/// #[derive(Debug, PartialEq, Deserialize)]
/// struct Container { name: String }
///
/// let bytes = br#"{"name":"logs","count":3}"#;
/// let container: Container = from_json(bytes).expect("deserialize");
/// assert_eq!(container, Container { name: "logs".to_string() });
/// ```
pub fn from_json<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, ParsingError> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(&mut deserializer)
        .map_err(|e| ParsingError::json(e.path().to_string(), e.inner().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_as_str() {
        assert_eq!(ContentType::Json.as_str(), "application/json");
        assert_eq!(ContentType::Xml.as_str(), "application/xml");
        assert_eq!(
            ContentType::FormUrlEncoded.to_string(),
            "application/x-www-form-urlencoded"
        );
    }

    #[test]
    fn body_accessors() {
        let body = Body::new(ContentType::Xml, "<Deployment/>");
        assert_eq!(body.content_type(), ContentType::Xml);
        assert_eq!(body.bytes().as_ref(), b"<Deployment/>");
        assert_eq!(body.into_bytes(), Bytes::from_static(b"<Deployment/>"));
    }

    #[test]
    fn repeated_form_fields() {
        #[derive(serde::Serialize)]
        struct Filter {
            prefix: String,
            tags: Vec<String>,
        }

        let filter = Filter {
            prefix: "img".to_string(),
            tags: vec!["a".to_string(), "b".to_string()],
        };

        let bytes = to_form(&filter).expect("serialize");
        assert_eq!(bytes.as_ref(), b"prefix=img&tags=a&tags=b");
    }

    #[test]
    fn to_query_string_skips_none() {
        #[derive(serde::Serialize)]
        struct Listing {
            #[serde(skip_serializing_if = "Option::is_none")]
            marker: Option<String>,
            limit: u32,
        }

        let query = to_query_string(&Listing {
            marker: None,
            limit: 10,
        })
        .expect("serialize");
        assert_eq!(query, "limit=10");
    }

    #[test]
    fn from_json_missing_field_reports_path() {
        #[derive(Debug, serde::Deserialize)]
        struct Quota {
            #[allow(dead_code)]
            bytes: u64,
        }

        #[derive(Debug, serde::Deserialize)]
        struct Account {
            #[allow(dead_code)]
            quota: Quota,
        }

        let err = from_json::<Account>(br#"{"quota":{}}"#).expect_err("missing bytes");
        let ParsingError::Json { path, message } = err else {
            panic!("expected a JSON error, got {err:?}");
        };
        assert_eq!(path, "quota");
        assert!(message.contains("bytes"), "{message}");
    }

    #[test]
    fn malformed_json_is_a_parsing_error() {
        let err = from_json::<serde_json::Value>(b"{\"name\":").expect_err("truncated");
        assert!(matches!(err, ParsingError::Json { .. }));
    }
}
