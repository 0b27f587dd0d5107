//! OpenStack Swift: account metadata.
//!
//! `HEAD` on the account URL answers with an empty body; everything is in
//! the `X-Account-*` headers.

use std::collections::BTreeMap;

use rivet::filters::SessionHeaderFilter;
use rivet::{
    DescriptorError, Method, OperationDescriptor, OperationId, ParsingError, Registry, Response,
    SessionCache, StatusMapping,
};

/// Header carrying the Keystone token.
pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

const METADATA_PREFIX: &str = "X-Account-Meta-";

/// `HEAD /` on the account URL.
pub const GET_ACCOUNT: OperationId<(), Account> = OperationId::new("swift.account.get");

/// Storage account summary.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Account {
    /// Number of containers.
    pub container_count: u64,
    /// Number of objects across all containers.
    pub object_count: u64,
    /// Bytes stored.
    pub bytes_used: u64,
    /// User metadata, keyed by the lowercased name after `X-Account-Meta-`.
    pub metadata: BTreeMap<String, String>,
}

/// Reads an [`Account`] from response headers. The body is never read.
///
/// # Errors
///
/// [`ParsingError::MissingHeader`] or [`ParsingError::InvalidHeader`] when
/// a count header is absent or not a number.
pub fn parse_account(response: Response) -> Result<Account, ParsingError> {
    Ok(Account {
        container_count: response.parse_header("X-Account-Container-Count")?,
        object_count: response.parse_header("X-Account-Object-Count")?,
        bytes_used: response.parse_header("X-Account-Bytes-Used")?,
        metadata: response
            .headers_with_prefix(METADATA_PREFIX)
            .map(|(key, value)| (key, value.to_string()))
            .collect(),
    })
}

/// The `X-Auth-Token` filter backed by `session`.
#[must_use]
pub fn auth_token_filter(session: SessionCache) -> SessionHeaderFilter {
    SessionHeaderFilter::new(AUTH_TOKEN_HEADER, session)
}

/// The `GET_ACCOUNT` descriptor. A 401 renews the session.
///
/// # Errors
///
/// Fails only if the descriptor itself is malformed.
pub fn get_account(session: &SessionCache) -> Result<OperationDescriptor<(), Account>, DescriptorError> {
    OperationDescriptor::builder(GET_ACCOUNT, Method::Head, "/")
        .filter(auth_token_filter(session.clone()))
        .parser(parse_account)
        .on_status(401, StatusMapping::SessionExpired)
        .on_status(403, StatusMapping::AccessDenied)
        .on_status(404, StatusMapping::NotFound)
        .build()
}

/// Register every Swift descriptor.
///
/// # Errors
///
/// [`DescriptorError::DuplicateOperation`] if a Swift operation is already
/// registered.
pub fn register(registry: &mut Registry, session: &SessionCache) -> Result<(), DescriptorError> {
    registry.register(get_account(session)?)
}
