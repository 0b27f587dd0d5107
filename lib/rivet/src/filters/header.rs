//! Static header filter.

use crate::{AuthenticationError, Request, RequestFilter};

/// Sets fixed headers on every request, replacing existing values.
///
/// Used for API version and content negotiation headers.
#[derive(Debug, Clone, Default)]
pub struct HeaderFilter {
    headers: Vec<(String, String)>,
}

impl HeaderFilter {
    /// Create an empty filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

impl RequestFilter for HeaderFilter {
    fn apply(&self, request: Request) -> Result<Request, AuthenticationError> {
        Ok(self
            .headers
            .iter()
            .fold(request.into_builder(), |builder, (name, value)| {
                builder.header(name.as_str(), value.as_str())
            })
            .build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Method;

    #[test]
    fn sets_and_replaces_headers() {
        let request = Request::builder(
            Method::Post,
            url::Url::parse("https://management.example.com/sub/services").expect("valid URL"),
        )
        .header("x-ms-version", "2012-03-01")
        .build();

        let filter = HeaderFilter::new()
            .header("x-ms-version", "2014-10-01")
            .header("Accept", "application/xml");

        let filtered = filter.apply(filter.apply(request).expect("apply")).expect("apply");
        assert_eq!(filtered.header("X-MS-Version"), Some("2014-10-01"));
        assert_eq!(filtered.headers().get_all("x-ms-version").count(), 1);
        assert_eq!(filtered.header("accept"), Some("application/xml"));
    }
}
