//! Session token header filter.

use crate::{AuthenticationError, Request, RequestFilter, SessionCache};

/// Sets a named header to the cached session token.
///
/// Covers vendor session headers such as `X-Auth-Token` and
/// `x-vcloud-authorization`.
#[derive(Debug, Clone)]
pub struct SessionHeaderFilter {
    header: String,
    cache: SessionCache,
}

impl SessionHeaderFilter {
    /// Create a filter writing the token of `cache` into `header`.
    pub fn new(header: impl Into<String>, cache: SessionCache) -> Self {
        Self {
            header: header.into(),
            cache,
        }
    }

    /// Header name.
    #[must_use]
    pub fn header_name(&self) -> &str {
        &self.header
    }
}

impl RequestFilter for SessionHeaderFilter {
    fn apply(&self, request: Request) -> Result<Request, AuthenticationError> {
        let token = self.cache.token().ok_or_else(|| {
            AuthenticationError::session_expired(format!("no valid token for `{}`", self.header))
        })?;

        Ok(request
            .into_builder()
            .header(self.header.as_str(), token.value())
            .build())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::{AuthFuture, Authenticator, Credentials, Method, SessionToken};

    struct Unused;

    impl Authenticator for Unused {
        fn login<'a>(&'a self, _credentials: &'a Credentials) -> AuthFuture<'a> {
            Box::pin(async { Err(AuthenticationError::InvalidCredentials("unused".into())) })
        }
    }

    fn request() -> Request {
        Request::builder(
            Method::Head,
            url::Url::parse("https://storage.example.com/v1/AUTH_acct").expect("valid URL"),
        )
        .build()
    }

    #[test]
    fn injects_token() {
        let cache = SessionCache::builder(Unused, Credentials::new("u", "p"))
            .token(SessionToken::new("AUTH_tk1"))
            .build();
        let filter = SessionHeaderFilter::new("X-Auth-Token", cache);

        let filtered = filter.apply(request()).expect("apply");
        assert_eq!(filtered.header("x-auth-token"), Some("AUTH_tk1"));
        assert_eq!(filter.header_name(), "X-Auth-Token");
    }

    #[test]
    fn expired_token_is_recoverable() {
        let cache = SessionCache::builder(Unused, Credentials::new("u", "p"))
            .token(SessionToken::new("old").with_expiry(Instant::now()))
            .build();
        let filter = SessionHeaderFilter::new("x-vcloud-authorization", cache);

        let err = filter.apply(request()).expect_err("expired");
        assert!(matches!(err, AuthenticationError::SessionExpired(_)));
    }
}
