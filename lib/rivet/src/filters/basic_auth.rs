//! Basic authentication filter.

use std::fmt;
use std::sync::Arc;

use base64::Engine;

use crate::{AuthenticationError, Request, RequestFilter};

/// Sets `Authorization: Basic <base64(username:password)>`.
///
/// # Example
///
/// ```
/// use rivet::filters::BasicAuthFilter;
/// use rivet::{Method, Request, RequestFilter};
///
/// let filter = BasicAuthFilter::new("admin@org", "secret");
/// let request = Request::builder(Method::Post, "https://vcloud.example.com/api/sessions".parse().unwrap()).build();
/// let request = filter.apply(request).unwrap();
/// assert_eq!(request.header("Authorization"), Some("Basic YWRtaW5Ab3JnOnNlY3JldA=="));
/// ```
#[derive(Clone)]
pub struct BasicAuthFilter {
    header_value: Arc<str>,
}

impl BasicAuthFilter {
    /// Create a filter for the given username and password.
    pub fn new(username: impl AsRef<str>, password: impl AsRef<str>) -> Self {
        let credentials = format!("{}:{}", username.as_ref(), password.as_ref());
        let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
        Self {
            header_value: Arc::from(format!("Basic {encoded}")),
        }
    }
}

impl fmt::Debug for BasicAuthFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuthFilter").finish_non_exhaustive()
    }
}

impl RequestFilter for BasicAuthFilter {
    fn apply(&self, request: Request) -> Result<Request, AuthenticationError> {
        Ok(request
            .into_builder()
            .header("Authorization", &*self.header_value)
            .build())
    }
}
