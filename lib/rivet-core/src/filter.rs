//! Request filter contract.
//!
//! Filters run after binding, in declared order, just before the request is
//! handed to the transport. They see a frozen [`Request`] and return a new
//! one. Filters must replace the headers they own rather than append to them,
//! because the dispatcher re-runs the chain over the pre-filter request on
//! every attempt.

use std::sync::Arc;

use crate::{AuthenticationError, Request};

/// Augments an outbound request before dispatch.
pub trait RequestFilter: Send + Sync {
    /// Returns the filtered request.
    ///
    /// [`AuthenticationError::SessionExpired`] asks the dispatcher to renew
    /// the session and rebuild the request.
    fn apply(&self, request: Request) -> Result<Request, AuthenticationError>;
}

impl<F> RequestFilter for F
where
    F: Fn(Request) -> Result<Request, AuthenticationError> + Send + Sync,
{
    fn apply(&self, request: Request) -> Result<Request, AuthenticationError> {
        self(request)
    }
}

/// Runs every filter in order, stopping at the first failure.
pub fn apply_filters(
    filters: &[Arc<dyn RequestFilter>],
    request: Request,
) -> Result<Request, AuthenticationError> {
    filters
        .iter()
        .try_fold(request, |request, filter| filter.apply(request))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Method;

    fn request() -> Request {
        Request::builder(
            Method::Get,
            url::Url::parse("https://vcloud.example.com/api/org").expect("valid URL"),
        )
        .build()
    }

    #[test]
    fn filters_run_in_order() {
        let filters: Vec<Arc<dyn RequestFilter>> = vec![
            Arc::new(|request: Request| -> Result<Request, AuthenticationError> {
                Ok(request.to_builder().header("X-Step", "one").build())
            }),
            Arc::new(|request: Request| -> Result<Request, AuthenticationError> {
                let previous = request.header("X-Step").unwrap_or_default().to_string();
                Ok(request
                    .to_builder()
                    .header("X-Step", format!("{previous},two"))
                    .build())
            }),
        ];

        let filtered = apply_filters(&filters, request()).expect("filters");
        assert_eq!(filtered.header("X-Step"), Some("one,two"));
    }

    #[test]
    fn first_failure_stops_the_chain() {
        let filters: Vec<Arc<dyn RequestFilter>> = vec![
            Arc::new(|_: Request| -> Result<Request, AuthenticationError> {
                Err(AuthenticationError::session_expired("no token"))
            }),
            Arc::new(|_: Request| -> Result<Request, AuthenticationError> {
                Err(AuthenticationError::Signing("must not run".to_string()))
            }),
        ];

        let err = apply_filters(&filters, request()).expect_err("fails");
        assert!(err.is_recoverable());
    }

    #[test]
    fn empty_chain_is_identity() {
        let original = request();
        assert_eq!(apply_filters(&[], original.clone()).expect("ok"), original);
    }
}
