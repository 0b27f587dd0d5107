//! Reference providers for rivet.
//!
//! Each module declares the operation descriptors, binders, parsers and
//! authenticators of one vendor API:
//!
//! - [`azure`]: hosted service deployments, bound as a schema-ordered XML tree
//! - [`swift`]: account metadata read from response headers
//! - [`vcloud`]: session login and the `x-vcloud-authorization` filter
//!
//! Every module exposes a `register` function adding its descriptors to a
//! [`rivet::Registry`].

pub mod azure;
pub mod swift;
pub mod vcloud;
