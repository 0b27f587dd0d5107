//! HMAC-SHA256 request signing.
//!
//! The string to sign is
//!
//! ```text
//! METHOD
//! /path?query
//! name:value        (one line per signed header, in request order)
//! hex(sha256(body))
//! ```
//!
//! Header names are lowercased and values trimmed. The filter first sets
//! `X-Content-SHA256` to the body digest, so it can be signed like any other
//! header, then sets
//! `Authorization: <scheme> keyId=<id>,headers=<names>,signature=<hex>`.
//!
//! Every configured header must be present on the request, otherwise signing
//! fails.

use std::fmt;
use std::sync::Arc;

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::{AuthenticationError, Request, RequestFilter};

type HmacSha256 = Hmac<Sha256>;

const CONTENT_DIGEST_HEADER: &str = "X-Content-SHA256";

/// Signs requests with a shared secret.
#[derive(Clone)]
pub struct HmacSigningFilter {
    key_id: Arc<str>,
    secret: Arc<[u8]>,
    scheme: Arc<str>,
    signed_headers: Arc<[String]>,
}

impl HmacSigningFilter {
    /// Create a filter signing `x-content-sha256` only.
    pub fn new(key_id: impl Into<String>, secret: impl AsRef<[u8]>) -> Self {
        Self {
            key_id: Arc::from(key_id.into()),
            secret: Arc::from(secret.as_ref()),
            scheme: Arc::from("HMAC-SHA256"),
            signed_headers: Arc::from(vec!["x-content-sha256".to_string()]),
        }
    }

    /// Set the scheme written before the parameters in `Authorization`.
    #[must_use]
    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Arc::from(scheme.into());
        self
    }

    /// Replace the set of header names to sign (matched case-insensitively).
    #[must_use]
    pub fn signed_headers<S: AsRef<str>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        let names: Vec<String> = names
            .into_iter()
            .map(|name| name.as_ref().to_ascii_lowercase())
            .collect();
        self.signed_headers = Arc::from(names);
        self
    }

    fn is_signed(&self, name: &str) -> bool {
        self.signed_headers
            .iter()
            .any(|signed| signed.eq_ignore_ascii_case(name))
    }

    /// Builds the canonical string and the list of signed header names.
    fn string_to_sign(
        &self,
        request: &Request,
        body_digest: &str,
    ) -> Result<(String, Vec<String>), AuthenticationError> {
        if let Some(missing) = self
            .signed_headers
            .iter()
            .find(|name| request.header(name).is_none())
        {
            return Err(AuthenticationError::Signing(format!(
                "signed header `{missing}` is missing from the request"
            )));
        }

        let url = request.url();
        let mut target = url.path().to_string();
        if let Some(query) = url.query() {
            target.push('?');
            target.push_str(query);
        }

        let mut names = Vec::new();
        let mut lines = vec![request.method().as_str().to_string(), target];
        for (name, value) in request.headers().iter() {
            if self.is_signed(name) {
                let name = name.to_ascii_lowercase();
                lines.push(format!("{name}:{}", value.trim()));
                names.push(name);
            }
        }
        lines.push(body_digest.to_string());

        Ok((lines.join("\n"), names))
    }

    fn sign(&self, data: &str) -> Result<String, AuthenticationError> {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(&self.secret)
            .map_err(|e| AuthenticationError::Signing(format!("HMAC initialization failed: {e}")))?;
        mac.update(data.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

impl fmt::Debug for HmacSigningFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HmacSigningFilter")
            .field("key_id", &self.key_id)
            .field("scheme", &self.scheme)
            .field("signed_headers", &self.signed_headers)
            .finish_non_exhaustive()
    }
}

impl RequestFilter for HmacSigningFilter {
    fn apply(&self, request: Request) -> Result<Request, AuthenticationError> {
        let body_digest = hex::encode(Sha256::digest(request.body_bytes()));
        let request = request
            .into_builder()
            .remove_header("Authorization")
            .header(CONTENT_DIGEST_HEADER, body_digest.as_str())
            .build();

        let (to_sign, names) = self.string_to_sign(&request, &body_digest)?;
        let signature = self.sign(&to_sign)?;

        let authorization = format!(
            "{} keyId={},headers={},signature={signature}",
            self.scheme,
            self.key_id,
            names.join(";")
        );

        Ok(request
            .into_builder()
            .header("Authorization", authorization)
            .build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ContentType, Method};

    fn request() -> Request {
        Request::builder(
            Method::Post,
            url::Url::parse("https://api.example.com/v1/items?limit=5").expect("valid URL"),
        )
        .header("X-Date", "20141014T000000Z")
        .bytes(ContentType::Json, r#"{"name":"a"}"#)
        .build()
    }

    #[test]
    fn canonical_string_follows_request_order() {
        let filter = HmacSigningFilter::new("key-1", "secret").signed_headers([
            "x-date",
            "content-type",
        ]);
        let (to_sign, names) = filter
            .string_to_sign(&request(), "digest")
            .expect("canonical string");

        insta::assert_snapshot!(to_sign, @r"
        POST
        /v1/items?limit=5
        x-date:20141014T000000Z
        content-type:application/json
        digest
        ");
        assert_eq!(names, ["x-date", "content-type"]);
    }

    #[test]
    fn missing_signed_header_fails() {
        let filter = HmacSigningFilter::new("key-1", "secret").signed_headers([
            "x-content-sha256",
            "x-date",
            "x-request-id",
        ]);
        let err = filter.apply(request()).expect_err("unsigned header");

        assert!(!err.is_recoverable());
        assert!(
            matches!(&err, AuthenticationError::Signing(message) if message.contains("x-request-id")),
            "{err:?}"
        );
    }

    #[test]
    fn authorization_carries_signature() {
        let filter = HmacSigningFilter::new("key-1", "secret");
        let signed = filter.apply(request()).expect("sign");

        let digest = hex::encode(Sha256::digest(br#"{"name":"a"}"#));
        assert_eq!(signed.header("x-content-sha256"), Some(digest.as_str()));

        let authorization = signed.header("Authorization").expect("authorization");
        assert!(authorization.starts_with(
            "HMAC-SHA256 keyId=key-1,headers=x-content-sha256,signature="
        ));
        let signature = authorization.rsplit('=').next().expect("signature");
        assert_eq!(signature.len(), 64);
    }

    #[test]
    fn bodiless_request_signs_with_defaults() {
        let request = Request::builder(
            Method::Get,
            url::Url::parse("https://api.example.com/v1/items").expect("valid URL"),
        )
        .build();
        let signed = HmacSigningFilter::new("key-1", "secret")
            .apply(request)
            .expect("sign");

        let digest = hex::encode(Sha256::digest(b""));
        assert_eq!(signed.header("x-content-sha256"), Some(digest.as_str()));
        assert!(signed.header("Authorization").is_some());
    }

    #[test]
    fn signing_is_idempotent() {
        let filter = HmacSigningFilter::new("key-1", "secret").scheme("EXAMPLE-HMAC");
        let once = filter.apply(request()).expect("sign");
        let twice = filter.apply(once.clone()).expect("sign");

        assert_eq!(once, twice);
        assert_eq!(twice.headers().get_all("authorization").count(), 1);
    }

    #[test]
    fn different_secrets_differ() {
        let a = HmacSigningFilter::new("k", "one").apply(request()).expect("sign");
        let b = HmacSigningFilter::new("k", "two").apply(request()).expect("sign");
        assert_ne!(a.header("Authorization"), b.header("Authorization"));
    }
}
