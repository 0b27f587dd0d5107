//! HTTPS connector using rustls.

use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::connect::HttpConnector;

use crate::TransportConfig;

/// Mozilla root certificates.
#[must_use]
pub fn webpki_root_store() -> rustls::RootCertStore {
    webpki_roots::TLS_SERVER_ROOTS.iter().cloned().collect()
}

/// Create an HTTPS connector trusting `roots`.
///
/// Supports HTTP/1.1 and HTTP/2, accepts plain `http` URLs, and applies the
/// configured connect timeout.
#[must_use]
pub fn https_connector(
    config: &TransportConfig,
    roots: rustls::RootCertStore,
) -> HttpsConnector<HttpConnector> {
    let tls_config = rustls::ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();

    let mut http = HttpConnector::new();
    http.enforce_http(false);
    http.set_connect_timeout(Some(config.connect_timeout));

    HttpsConnectorBuilder::new()
        .with_tls_config(tls_config)
        .https_or_http()
        .enable_http1()
        .enable_http2()
        .wrap_connector(http)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_store_is_populated() {
        assert!(!webpki_root_store().is_empty());
    }

    #[test]
    fn creates_connector() {
        let _connector = https_connector(&TransportConfig::default(), webpki_root_store());
    }
}
