//! VMware vCloud Director 1.5: session login.
//!
//! A session is opened with `POST /api/sessions` under Basic authentication.
//! The token comes back in the `x-vcloud-authorization` response header and
//! is sent in the same header on every later call.

use rivet::filters::{BasicAuthFilter, HeaderFilter, SessionHeaderFilter};
use rivet::url::Url;
use rivet::{
    AuthFuture, AuthenticationError, Authenticator, Credentials, DescriptorError, Method,
    OperationDescriptor, OperationId, Registry, Request, RequestFilter, SessionCache,
    SessionToken, StatusMapping, TextParser, Transport,
};
use tracing::{debug, warn};

/// Session token header, in requests and in the login response.
pub const AUTHORIZATION_HEADER: &str = "x-vcloud-authorization";

/// Media type accepted by the login endpoint.
pub const SESSION_ACCEPT: &str = "application/*+xml;version=1.5";

/// `GET /tasksList/{org}`: the raw `TasksList` document of an organization.
pub const GET_TASKS_LIST: OperationId<(), String> = OperationId::new("vcloud.tasks.list");

/// Opens vCloud sessions over a transport.
#[derive(Debug, Clone)]
pub struct VcloudAuthenticator<T> {
    transport: T,
    sessions_url: Url,
}

impl<T: Transport> VcloudAuthenticator<T> {
    /// Create an authenticator for the API rooted at `api` (for example
    /// `https://vcloud.example.com/api`).
    pub fn new(transport: T, api: &Url) -> Self {
        let mut sessions_url = api.clone();
        sessions_url.set_path(&format!("{}/sessions", api.path().trim_end_matches('/')));
        Self {
            transport,
            sessions_url,
        }
    }

    /// The login endpoint.
    #[must_use]
    pub fn sessions_url(&self) -> &Url {
        &self.sessions_url
    }

    fn login_request(&self, credentials: &Credentials) -> Result<Request, AuthenticationError> {
        let request = Request::builder(Method::Post, self.sessions_url.clone())
            .header("Accept", SESSION_ACCEPT)
            .build();
        BasicAuthFilter::new(credentials.identity(), credentials.secret()).apply(request)
    }

    async fn open_session(&self, credentials: &Credentials) -> Result<SessionToken, AuthenticationError> {
        let request = self.login_request(credentials)?;
        debug!(url = %self.sessions_url, identity = credentials.identity(), "opening vCloud session");

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|err| AuthenticationError::Transport(err.to_string()))?;

        match response.status() {
            200..=299 => match response.header(AUTHORIZATION_HEADER) {
                Some(token) if !token.trim().is_empty() => Ok(SessionToken::new(token.trim())),
                _ => {
                    warn!("login response carries no session token");
                    Err(AuthenticationError::Rejected {
                        status: response.status(),
                    })
                }
            },
            401 => Err(AuthenticationError::InvalidCredentials(format!(
                "vCloud refused `{}`",
                credentials.identity()
            ))),
            status => Err(AuthenticationError::Rejected { status }),
        }
    }
}

impl<T: Transport> Authenticator for VcloudAuthenticator<T> {
    fn login<'a>(&'a self, credentials: &'a Credentials) -> AuthFuture<'a> {
        Box::pin(self.open_session(credentials))
    }
}

/// The `x-vcloud-authorization` filter backed by `session`.
#[must_use]
pub fn session_filter(session: SessionCache) -> SessionHeaderFilter {
    SessionHeaderFilter::new(AUTHORIZATION_HEADER, session)
}

/// The `GET_TASKS_LIST` descriptor.
///
/// # Errors
///
/// Fails only if the descriptor itself is malformed.
pub fn get_tasks_list(session: &SessionCache) -> Result<OperationDescriptor<(), String>, DescriptorError> {
    OperationDescriptor::builder(GET_TASKS_LIST, Method::Get, "/tasksList/{org}")
        .filter(HeaderFilter::new().header("Accept", "*/*"))
        .filter(session_filter(session.clone()))
        .parser(TextParser)
        .on_status(401, StatusMapping::SessionExpired)
        .on_status(403, StatusMapping::AccessDenied)
        .on_status(404, StatusMapping::NotFound)
        .build()
}

/// Register every vCloud descriptor.
///
/// # Errors
///
/// [`DescriptorError::DuplicateOperation`] if a vCloud operation is already
/// registered.
pub fn register(registry: &mut Registry, session: &SessionCache) -> Result<(), DescriptorError> {
    registry.register(get_tasks_list(session)?)
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use rivet::mock::MockTransport;
    use rivet::{Dispatcher, Error, PathArgs, TransportError};

    use super::*;

    const ORG: &str = "6f312e42-cd2b-488d-a2bb-97519cd57ed0";
    const TOKEN: &str = "AtatAgvJMrwOc9pDQq4RRCRLazThpnTKJDxSVH9oB2I=";
    const TASKS_LIST: &str = r#"<TasksList name="Tasks Lists" type="application/vnd.vmware.vcloud.tasksList+xml"/>"#;

    fn api() -> Url {
        Url::parse("https://vcloud.example.com/api").expect("url")
    }

    fn credentials() -> Credentials {
        Credentials::new("admin@org", "secret")
    }

    fn login_response(transport: MockTransport) -> MockTransport {
        transport.respond(
            200,
            &[
                ("x-vcloud-authorization", TOKEN),
                ("Content-Type", "application/vnd.vmware.vcloud.session+xml;version=1.5"),
            ],
            r#"<Session user="admin" org="org"/>"#,
        )
    }

    #[tokio::test]
    async fn login_reads_token_header() {
        let transport = login_response(MockTransport::new());
        let authenticator = VcloudAuthenticator::new(transport.clone(), &api());

        let token = authenticator.login(&credentials()).await.expect("token");
        check!(token.value() == TOKEN);

        let requests = transport.requests();
        let_assert!([request] = requests.as_slice());
        check!(request.method() == Method::Post);
        check!(request.url().as_str() == "https://vcloud.example.com/api/sessions");
        check!(request.header("Accept") == Some(SESSION_ACCEPT));
        check!(request.header("Authorization") == Some("Basic YWRtaW5Ab3JnOnNlY3JldA=="));
    }

    #[tokio::test]
    async fn login_failures() {
        let transport = MockTransport::new()
            .respond(401, &[], "")
            .respond(500, &[], "")
            .respond(200, &[], "")
            .fail(TransportError::connection("refused"));
        let authenticator = VcloudAuthenticator::new(transport, &api());

        let refused = authenticator.login(&credentials()).await;
        check!(matches!(refused, Err(AuthenticationError::InvalidCredentials(_))));

        let broken = authenticator.login(&credentials()).await;
        check!(broken == Err(AuthenticationError::Rejected { status: 500 }));

        let tokenless = authenticator.login(&credentials()).await;
        check!(tokenless == Err(AuthenticationError::Rejected { status: 200 }));

        let offline = authenticator.login(&credentials()).await;
        check!(matches!(offline, Err(AuthenticationError::Transport(_))));
    }

    #[tokio::test]
    async fn login_then_tasks_list() {
        let transport = login_response(MockTransport::new()).respond(
            200,
            &[("Content-Type", "application/vnd.vmware.vcloud.tasksList+xml;version=1.5")],
            TASKS_LIST,
        );

        let session = SessionCache::new(VcloudAuthenticator::new(transport.clone(), &api()), credentials());
        let mut registry = Registry::new();
        register(&mut registry, &session).expect("register");

        let dispatcher = Dispatcher::builder(transport.clone(), api())
            .registry(registry)
            .session(session)
            .build();

        let tasks = dispatcher
            .invoke_at(&GET_TASKS_LIST, &PathArgs::new().with("org", ORG), &())
            .await
            .expect("tasks list");
        check!(tasks == TASKS_LIST);

        let requests = transport.requests();
        let_assert!([login, list] = requests.as_slice());
        check!(login.url().path() == "/api/sessions");
        check!(login.header("Authorization") == Some("Basic YWRtaW5Ab3JnOnNlY3JldA=="));

        check!(list.method() == Method::Get);
        check!(list.url().as_str() == format!("https://vcloud.example.com/api/tasksList/{ORG}"));
        check!(list.header("Accept") == Some("*/*"));
        check!(list.header(AUTHORIZATION_HEADER) == Some(TOKEN));
        check!(list.header("Authorization").is_none());
    }

    #[tokio::test]
    async fn refused_login_fails_the_invocation() {
        let transport = MockTransport::new().respond(401, &[], "");
        let session = SessionCache::new(VcloudAuthenticator::new(transport.clone(), &api()), credentials());
        let mut registry = Registry::new();
        register(&mut registry, &session).expect("register");

        let dispatcher = Dispatcher::builder(transport.clone(), api())
            .registry(registry)
            .session(session)
            .build();

        let err = dispatcher
            .invoke_at(&GET_TASKS_LIST, &PathArgs::new().with("org", ORG), &())
            .await
            .expect_err("refused");
        check!(matches!(
            err,
            Error::Authentication(AuthenticationError::InvalidCredentials(_))
        ));
        check!(transport.requests().len() == 1);
    }
}
