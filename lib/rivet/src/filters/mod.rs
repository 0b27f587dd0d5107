//! Request filters applied after binding, just before dispatch.
//!
//! - [`SessionHeaderFilter`] - named header carrying the cached session token
//! - [`BearerTokenFilter`] - `Authorization: Bearer <token>`
//! - [`BasicAuthFilter`] - `Authorization: Basic <base64(user:pass)>`
//! - [`HeaderFilter`] - static headers such as API versions
//! - [`HmacSigningFilter`] - HMAC-SHA256 request signature
//!
//! Every filter replaces the headers it owns, so re-running the chain on a
//! retry never duplicates them.

mod basic_auth;
mod bearer_auth;
mod header;
mod session_header;
mod signing;

pub use basic_auth::BasicAuthFilter;
pub use bearer_auth::BearerTokenFilter;
pub use header::HeaderFilter;
pub use session_header::SessionHeaderFilter;
pub use signing::HmacSigningFilter;
