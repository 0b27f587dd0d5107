//! Operation descriptors and the registry.
//!
//! An [`OperationDescriptor`] is the declarative record of one remote
//! operation: method, path template, binders, filters, parser, status
//! mappings and idempotency. Descriptors are built once at startup with
//! [`OperationDescriptor::builder`], collected into a [`Registry`] and read
//! concurrently afterwards.
//!
//! # Example
//!
//! ```
//! use rivet_core::{Method, OperationDescriptor, OperationId, Registry, Response, ParsingError, StatusMapping};
//!
//! pub const GET_COUNT: OperationId<(), u32> = OperationId::new("example.count.get");
//!
//! let descriptor = OperationDescriptor::builder(GET_COUNT, Method::Head, "/")
//!     .parser(|response: Response| -> Result<u32, ParsingError> { response.parse_header("X-Count") })
//!     .on_status(404, StatusMapping::NotFound)
//!     .build()
//!     .unwrap();
//!
//! let mut registry = Registry::new();
//! registry.register(descriptor).unwrap();
//! assert!(registry.get(&GET_COUNT).is_ok());
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::{
    Binder, BindingError, DescriptorError, Error, Method, ParsingError, PathArgs, PathTemplate,
    Request, RequestFilter, Response, ResponseParser, StatusOnly,
};

// ============================================================================
// Operation Identity
// ============================================================================

/// Typed identity of an operation taking `I` and producing `O`.
///
/// The types travel with the key, so the dispatcher checks argument and
/// result types at compile time.
pub struct OperationId<I, O> {
    name: &'static str,
    _types: PhantomData<fn(&I) -> O>,
}

impl<I, O> OperationId<I, O> {
    /// Creates an identity from a unique name.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _types: PhantomData,
        }
    }

    /// Operation name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<I, O> Clone for OperationId<I, O> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<I, O> Copy for OperationId<I, O> {}

impl<I, O> fmt::Debug for OperationId<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("OperationId").field(&self.name).finish()
    }
}

impl<I, O> fmt::Display for OperationId<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

// ============================================================================
// Status Mapping
// ============================================================================

/// Meaning an operation assigns to a non-success status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusMapping {
    /// The addressed resource does not exist.
    NotFound,
    /// The request conflicts with the resource state.
    Conflict,
    /// The caller lacks permission.
    AccessDenied,
    /// The session must be renewed and the request rebuilt.
    SessionExpired,
}

// ============================================================================
// Descriptor
// ============================================================================

/// Declarative description of one remote operation.
pub struct OperationDescriptor<I, O> {
    id: OperationId<I, O>,
    method: Method,
    path: PathTemplate,
    binders: Vec<Box<dyn Binder<I>>>,
    filters: Vec<Arc<dyn RequestFilter>>,
    parser: Box<dyn ResponseParser<O>>,
    status_mappings: HashMap<u16, StatusMapping>,
    idempotent: bool,
}

impl<I, O> OperationDescriptor<I, O> {
    /// Starts a descriptor for `id` sending `method` to `path`.
    #[must_use]
    pub fn builder(
        id: OperationId<I, O>,
        method: Method,
        path: &'static str,
    ) -> OperationDescriptorBuilder<I, O> {
        OperationDescriptorBuilder {
            id,
            method,
            path,
            binders: Vec::new(),
            filters: Vec::new(),
            parser: None,
            status_mappings: HashMap::new(),
            idempotent: None,
        }
    }

    /// Typed identity.
    #[must_use]
    pub const fn id(&self) -> OperationId<I, O> {
        self.id
    }

    /// Operation name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.id.name
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Path template.
    #[must_use]
    pub const fn path(&self) -> &PathTemplate {
        &self.path
    }

    /// Request filters in application order.
    #[must_use]
    pub fn filters(&self) -> &[Arc<dyn RequestFilter>] {
        &self.filters
    }

    /// Mapping declared for a status code.
    #[must_use]
    pub fn status_mapping(&self, status: u16) -> Option<StatusMapping> {
        self.status_mappings.get(&status).copied()
    }

    /// Whether transport failures may be retried.
    #[must_use]
    pub const fn is_idempotent(&self) -> bool {
        self.idempotent
    }

    /// Builds the pre-filter request: expands the path onto `base`, then
    /// runs every binder in declared order.
    ///
    /// A template of `/` addresses `base` itself.
    pub fn build_request(
        &self,
        base: &url::Url,
        args: &PathArgs,
        input: &I,
    ) -> Result<Request, BindingError> {
        let rendered = self.path.render(args)?;
        let base_path = base.path().trim_end_matches('/');
        let path = if rendered == "/" && !base_path.is_empty() {
            base_path.to_string()
        } else {
            format!("{base_path}{rendered}")
        };

        let mut url = base.clone();
        url.set_path(&path);

        self.binders
            .iter()
            .try_fold(Request::builder(self.method, url), |request, binder| {
                binder.bind(request, input)
            })
            .map(crate::RequestBuilder::build)
    }

    /// Runs the declared parser.
    pub fn parse(&self, response: Response) -> Result<O, ParsingError> {
        self.parser.parse(response)
    }
}

impl<I, O> fmt::Debug for OperationDescriptor<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationDescriptor")
            .field("name", &self.id.name)
            .field("method", &self.method)
            .field("path", &self.path.as_str())
            .field("binders", &self.binders.len())
            .field("filters", &self.filters.len())
            .field("status_mappings", &self.status_mappings)
            .field("idempotent", &self.idempotent)
            .finish_non_exhaustive()
    }
}

/// Builder for [`OperationDescriptor`].
pub struct OperationDescriptorBuilder<I, O> {
    id: OperationId<I, O>,
    method: Method,
    path: &'static str,
    binders: Vec<Box<dyn Binder<I>>>,
    filters: Vec<Arc<dyn RequestFilter>>,
    parser: Option<Box<dyn ResponseParser<O>>>,
    status_mappings: HashMap<u16, StatusMapping>,
    idempotent: Option<bool>,
}

impl<I, O> OperationDescriptorBuilder<I, O> {
    /// Appends a binder.
    #[must_use]
    pub fn binder(mut self, binder: impl Binder<I> + 'static) -> Self {
        self.binders.push(Box::new(binder));
        self
    }

    /// Appends a request filter.
    #[must_use]
    pub fn filter(self, filter: impl RequestFilter + 'static) -> Self {
        self.shared_filter(Arc::new(filter))
    }

    /// Appends a filter shared with other descriptors.
    #[must_use]
    pub fn shared_filter(mut self, filter: Arc<dyn RequestFilter>) -> Self {
        self.filters.push(filter);
        self
    }

    /// Sets the response parser, replacing any previous one.
    #[must_use]
    pub fn parser(mut self, parser: impl ResponseParser<O> + 'static) -> Self {
        self.parser = Some(Box::new(parser));
        self
    }

    /// Maps a non-success status code.
    #[must_use]
    pub fn on_status(mut self, status: u16, mapping: StatusMapping) -> Self {
        self.status_mappings.insert(status, mapping);
        self
    }

    /// Overrides the idempotency derived from the method.
    #[must_use]
    pub const fn idempotent(mut self, idempotent: bool) -> Self {
        self.idempotent = Some(idempotent);
        self
    }

    /// Validates and builds the descriptor.
    pub fn build(self) -> Result<OperationDescriptor<I, O>, DescriptorError> {
        let path = PathTemplate::parse(self.path)?;
        let parser = self
            .parser
            .ok_or_else(|| DescriptorError::MissingParser(self.id.name.to_string()))?;

        Ok(OperationDescriptor {
            id: self.id,
            method: self.method,
            path,
            binders: self.binders,
            filters: self.filters,
            parser,
            status_mappings: self.status_mappings,
            idempotent: self
                .idempotent
                .unwrap_or_else(|| self.method.is_idempotent()),
        })
    }
}

impl<I> OperationDescriptorBuilder<I, ()> {
    /// Declares that the operation has no result beyond its status.
    #[must_use]
    pub fn no_result(self) -> Self {
        self.parser(StatusOnly)
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Read-only table of descriptors keyed by operation identity.
#[derive(Default)]
pub struct Registry {
    descriptors: HashMap<&'static str, Box<dyn Any + Send + Sync>>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a descriptor. Identities must be unique.
    pub fn register<I, O>(
        &mut self,
        descriptor: OperationDescriptor<I, O>,
    ) -> Result<(), DescriptorError>
    where
        I: 'static,
        O: 'static,
    {
        let name = descriptor.name();
        if self.descriptors.contains_key(name) {
            return Err(DescriptorError::DuplicateOperation(name.to_string()));
        }
        self.descriptors.insert(name, Box::new(descriptor));
        Ok(())
    }

    /// Adds a descriptor, returning the registry for chaining.
    pub fn with<I, O>(mut self, descriptor: OperationDescriptor<I, O>) -> Result<Self, DescriptorError>
    where
        I: 'static,
        O: 'static,
    {
        self.register(descriptor)?;
        Ok(self)
    }

    /// Looks up the descriptor for `id`.
    ///
    /// A name registered with other argument or result types is reported as
    /// unknown.
    pub fn get<I, O>(&self, id: &OperationId<I, O>) -> Result<&OperationDescriptor<I, O>, Error>
    where
        I: 'static,
        O: 'static,
    {
        self.descriptors
            .get(id.name())
            .and_then(|descriptor| descriptor.downcast_ref::<OperationDescriptor<I, O>>())
            .ok_or_else(|| Error::UnknownOperation(id.name().to_string()))
    }

    /// Returns `true` if a descriptor is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.descriptors.contains_key(name)
    }

    /// Registered operation names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.descriptors.keys().copied()
    }

    /// Number of registered descriptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.descriptors.keys().collect();
        names.sort_unstable();
        f.debug_struct("Registry").field("operations", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};

    use super::*;
    use crate::{Headers, RequestBuilder};

    const CREATE: OperationId<String, ()> = OperationId::new("test.container.create");
    const COUNT: OperationId<(), u32> = OperationId::new("test.container.count");

    fn base() -> url::Url {
        url::Url::parse("https://storage.example.com/v1/AUTH_acct/").expect("valid URL")
    }

    fn create() -> OperationDescriptor<String, ()> {
        OperationDescriptor::builder(CREATE, Method::Put, "/{container}")
            .binder(
                |request: RequestBuilder, owner: &String| -> Result<RequestBuilder, BindingError> {
                    Ok(request.header("X-Container-Meta-Owner", owner.as_str()))
                },
            )
            .no_result()
            .on_status(409, StatusMapping::Conflict)
            .build()
            .expect("valid descriptor")
    }

    #[test]
    fn build_request_expands_path_and_runs_binders() {
        let descriptor = create();
        let request = descriptor
            .build_request(
                &base(),
                &PathArgs::new().with("container", "a b/c"),
                &"ops".to_string(),
            )
            .expect("build");

        check!(request.method() == Method::Put);
        check!(request.url().as_str() == "https://storage.example.com/v1/AUTH_acct/a%20b%2Fc");
        check!(request.header("x-container-meta-owner") == Some("ops"));
    }

    #[test]
    fn root_template_addresses_base() {
        let descriptor = OperationDescriptor::builder(COUNT, Method::Head, "/")
            .parser(|response: Response| -> Result<u32, ParsingError> {
                response.parse_header("X-Count")
            })
            .build()
            .expect("valid descriptor");

        let request = descriptor
            .build_request(&base(), &PathArgs::new(), &())
            .expect("build");
        check!(request.url().as_str() == "https://storage.example.com/v1/AUTH_acct");
    }

    #[test]
    fn dot_segment_cannot_escape_the_template() {
        for value in ["..", ".", "", "%2E%2E"] {
            let result = create().build_request(
                &base(),
                &PathArgs::new().with("container", value),
                &"ops".to_string(),
            );
            let_assert!(Err(BindingError::InvalidValue { field, .. }) = result);
            check!(field == "container");
        }
    }

    #[test]
    fn missing_path_param_fails_before_binders() {
        let result = create().build_request(&base(), &PathArgs::new(), &"ops".to_string());
        let_assert!(Err(BindingError::MissingPathParam(name)) = result);
        check!(name == "container");
    }

    #[test]
    fn descriptor_requires_parser() {
        let result = OperationDescriptor::builder(COUNT, Method::Get, "/count").build();
        let_assert!(Err(DescriptorError::MissingParser(name)) = result);
        check!(name == "test.container.count");
    }

    #[test]
    fn descriptor_rejects_malformed_template() {
        let result = OperationDescriptor::builder(CREATE, Method::Put, "/{container")
            .no_result()
            .build();
        let_assert!(Err(DescriptorError::InvalidPathTemplate { .. }) = result);
    }

    #[test]
    fn idempotency_defaults_to_method_and_can_be_overridden() {
        check!(create().is_idempotent());

        let post = OperationDescriptor::builder(CREATE, Method::Post, "/")
            .no_result()
            .build()
            .expect("valid");
        check!(!post.is_idempotent());

        let overridden = OperationDescriptor::builder(CREATE, Method::Post, "/")
            .no_result()
            .idempotent(true)
            .build()
            .expect("valid");
        check!(overridden.is_idempotent());
    }

    #[test]
    fn status_mappings() {
        let descriptor = create();
        check!(descriptor.status_mapping(409) == Some(StatusMapping::Conflict));
        check!(descriptor.status_mapping(404).is_none());
        check!(
            descriptor
                .parse(Response::new(201, Headers::new(), ""))
                .is_ok()
        );
    }

    #[test]
    fn registry_rejects_duplicates() {
        let mut registry = Registry::new();
        registry.register(create()).expect("first");
        let_assert!(Err(DescriptorError::DuplicateOperation(name)) = registry.register(create()));
        check!(name == "test.container.create");
        check!(registry.len() == 1);
    }

    #[test]
    fn registry_lookup_is_typed() {
        let registry = Registry::new().with(create()).expect("register");

        check!(registry.get(&CREATE).is_ok());
        check!(registry.contains("test.container.create"));

        let_assert!(Err(Error::UnknownOperation(name)) = registry.get(&COUNT));
        check!(name == "test.container.count");

        let mistyped: OperationId<u32, ()> = OperationId::new("test.container.create");
        check!(registry.get(&mistyped).is_err());
    }
}
