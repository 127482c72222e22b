//! The access gate: middleware that decides, for every request, whether it may
//! reach its handler or must be redirected.

use std::{fmt, sync::Arc, time::Duration};

use axum::{
    extract::{FromRef, Request, State},
    http::{StatusCode, header::SET_COOKIE, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{CookieJar, cookie::Cookie};
use axum_htmx::HxRedirect;

use crate::{
    AppState,
    policy::{RouteCategory, RoutePolicy},
    redirect::{
        authenticated_landing_url, build_sign_in_redirect_url, is_hx_request, redirect_intent,
    },
    session::{
        Credentials, IdentityProvider, SessionEvidence, SessionUser, derive_session_evidence,
    },
};

/// What the gate decided to do with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Let the request through. Holds the verified user if the route needed one.
    Allow(Option<SessionUser>),
    /// The route needs a session and there is none. Holds the sign-in URL,
    /// which remembers where the user was going.
    RedirectToSignIn(String),
    /// A signed in user asked for an auth-only page. Holds where to send them instead.
    RedirectAuthenticated(String),
}

/// A [Decision] plus the cookies the identity provider wants set on the response.
#[derive(Debug, Clone, PartialEq)]
pub struct GateOutcome {
    /// What to do with the request.
    pub decision: Decision,
    /// Cookies to set whatever the decision, e.g. rotated session tokens.
    pub cookies: Vec<Cookie<'static>>,
}

impl GateOutcome {
    fn without_cookies(decision: Decision) -> Self {
        Self {
            decision,
            cookies: Vec::new(),
        }
    }
}

/// Decides whether requests may proceed, based on a [RoutePolicy] and
/// sessions verified by an [IdentityProvider].
///
/// Cheap to clone: the policy and provider are shared and never mutated.
#[derive(Clone)]
pub struct AccessGate {
    policy: Arc<RoutePolicy>,
    provider: Arc<dyn IdentityProvider>,
    lookup_timeout: Duration,
}

impl fmt::Debug for AccessGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessGate")
            .field("policy", &self.policy)
            .field("lookup_timeout", &self.lookup_timeout)
            .finish_non_exhaustive()
    }
}

impl AccessGate {
    /// Create a gate that enforces `policy`, verifying sessions with `provider`.
    ///
    /// Session lookups that take longer than `lookup_timeout` are treated as
    /// failed, which means signed out.
    pub fn new(
        policy: RoutePolicy,
        provider: Arc<dyn IdentityProvider>,
        lookup_timeout: Duration,
    ) -> Self {
        Self {
            policy: Arc::new(policy),
            provider,
            lookup_timeout,
        }
    }

    /// The route policy the gate enforces.
    pub fn policy(&self) -> &RoutePolicy {
        &self.policy
    }

    /// The identity provider the gate checks sessions with.
    pub fn provider(&self) -> &dyn IdentityProvider {
        self.provider.as_ref()
    }

    /// Read the credentials the provider understands from `parts`.
    pub fn credentials(&self, parts: &Parts) -> Credentials {
        let (access_token_cookie, refresh_token_cookie) = self.provider.token_cookie_names();

        Credentials::from_headers(&parts.headers, access_token_cookie, refresh_token_cookie)
    }

    /// Decide what to do with the request described by `parts`.
    ///
    /// The identity provider is only consulted for protected and auth-only
    /// routes. Any failure to verify the session counts as signed out.
    pub async fn evaluate(&self, parts: &Parts) -> GateOutcome {
        let category = self.policy.classify(parts.uri.path());
        if category == RouteCategory::Unrestricted {
            return GateOutcome::without_cookies(Decision::Allow(None));
        }

        let credentials = self.credentials(parts);
        let (evidence, cookies) =
            derive_session_evidence(self.provider(), &credentials, self.lookup_timeout).await;

        let decision = match (category, evidence) {
            (RouteCategory::Protected, SessionEvidence::Authenticated(user)) => {
                Decision::Allow(Some(user))
            }
            (RouteCategory::Protected, SessionEvidence::Anonymous) => {
                let intent = redirect_intent(parts, &self.policy);
                Decision::RedirectToSignIn(build_sign_in_redirect_url(
                    &self.policy,
                    intent.as_deref(),
                ))
            }
            (RouteCategory::AuthOnly, SessionEvidence::Authenticated(_)) => {
                Decision::RedirectAuthenticated(authenticated_landing_url(parts, &self.policy))
            }
            (RouteCategory::AuthOnly, SessionEvidence::Anonymous)
            | (RouteCategory::Unrestricted, _) => Decision::Allow(None),
        };

        GateOutcome { decision, cookies }
    }
}

impl FromRef<AppState> for AccessGate {
    fn from_ref(state: &AppState) -> Self {
        state.gate.clone()
    }
}

/// Middleware that runs the [AccessGate] on every request.
///
/// Allowed requests continue to their handler. If the route needed a session,
/// the verified user is placed in the request extensions first.
///
/// **Note**: Route handlers can use the function argument
/// `Extension(user): Extension<SessionUser>` to receive the user on protected routes.
///
/// Redirects are sent as a 303 See Other, or as an `HX-Redirect` header for
/// HTMX requests. Cookies from the identity provider are set on every response.
pub async fn access_gate(State(gate): State<AccessGate>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();
    let GateOutcome { decision, cookies } = gate.evaluate(&parts).await;

    let response = match decision {
        Decision::Allow(user) => {
            if let Some(user) = user {
                parts.extensions.insert(user);
            }

            next.run(Request::from_parts(parts, body)).await
        }
        Decision::RedirectToSignIn(redirect_url) => {
            tracing::debug!("No session for {}, redirecting to sign in.", parts.uri.path());
            redirect(&parts, &redirect_url)
        }
        Decision::RedirectAuthenticated(redirect_url) => {
            tracing::debug!(
                "Already signed in, redirecting {} to {redirect_url}.",
                parts.uri.path()
            );
            redirect(&parts, &redirect_url)
        }
    };

    with_cookies(response, cookies)
}

fn redirect(parts: &Parts, redirect_url: &str) -> Response {
    if is_hx_request(parts) {
        (HxRedirect(redirect_url.to_owned()), StatusCode::OK).into_response()
    } else {
        Redirect::to(redirect_url).into_response()
    }
}

fn with_cookies(response: Response, cookies: Vec<Cookie<'static>>) -> Response {
    if cookies.is_empty() {
        return response;
    }

    let jar = cookies
        .into_iter()
        .fold(CookieJar::new(), |jar, cookie| jar.add(cookie));

    let (mut parts, body) = response.into_parts();
    for (key, val) in jar.into_response().headers().iter() {
        if key != SET_COOKIE {
            continue;
        }

        parts.headers.append(key, val.to_owned());
    }

    Response::from_parts(parts, body)
}


#[cfg(test)]
mod access_gate_tests {
    use std::{sync::Arc, time::Duration};

    use axum::{Extension, Router, middleware, response::Html, routing::get};
    use axum_extra::extract::cookie::Cookie;
    use axum_test::TestServer;

    use crate::{
        config::GateConfig,
        gate::{AccessGate, access_gate},
        policy::RoutePolicy,
        session::{IdentityProvider, SessionLookup, SessionUser},
        test_utils::{StubIdentityProvider, test_user},
    };

    const SESSION_COOKIE: &str = "sb-access-token";

    async fn test_handler() -> Html<&'static str> {
        Html("<h1>Hello, World!</h1>")
    }

    async fn whoami(user: Option<Extension<SessionUser>>) -> String {
        match user {
            Some(Extension(user)) => user.email.unwrap_or(user.id),
            None => "nobody".to_owned(),
        }
    }

    fn get_test_server(provider: Arc<dyn IdentityProvider>) -> TestServer {
        let gate = AccessGate::new(
            RoutePolicy::new(GateConfig::default()).unwrap(),
            provider,
            Duration::from_millis(50),
        );

        let app = Router::new()
            .route("/", get(test_handler))
            .route("/dashboard", get(whoami))
            .route("/account/{account_id}", get(test_handler))
            .route("/transaction/create", get(test_handler))
            .route("/sign-in", get(whoami))
            .layer(middleware::from_fn_with_state(gate.clone(), access_gate))
            .with_state(gate);

        TestServer::new(app).expect("Could not create test server.")
    }

    fn session_cookie() -> Cookie<'static> {
        Cookie::new(SESSION_COOKIE, "valid")
    }

    #[tokio::test]
    async fn protected_route_without_cookie_redirects_with_intent() {
        let server = get_test_server(Arc::new(StubIdentityProvider::with_user(test_user())));

        let response = server
            .get("/dashboard")
            .add_query_param("tab", "overview")
            .await;

        response.assert_status_see_other();
        assert_eq!(
            response.header("location"),
            "/sign-in?redirect=%2Fdashboard%3Ftab%3Doverview"
        );
    }

    #[tokio::test]
    async fn protected_route_with_session_passes_user_to_handler() {
        let server = get_test_server(Arc::new(StubIdentityProvider::with_user(test_user())));

        let response = server.get("/dashboard").add_cookie(session_cookie()).await;

        response.assert_status_ok();
        response.assert_text("test@pesatrack.example");
    }

    #[tokio::test]
    async fn sign_in_with_session_redirects_to_dashboard() {
        let server = get_test_server(Arc::new(StubIdentityProvider::with_user(test_user())));

        let response = server.get("/sign-in").add_cookie(session_cookie()).await;

        response.assert_status_see_other();
        assert_eq!(response.header("location"), "/dashboard");
    }

    #[tokio::test]
    async fn sign_in_with_session_follows_redirect_param() {
        let server = get_test_server(Arc::new(StubIdentityProvider::with_user(test_user())));

        let response = server
            .get("/sign-in")
            .add_query_param("redirect", "/account/123")
            .add_cookie(session_cookie())
            .await;

        response.assert_status_see_other();
        assert_eq!(response.header("location"), "/account/123");
    }

    #[tokio::test]
    async fn sign_in_without_session_is_shown() {
        let server = get_test_server(Arc::new(StubIdentityProvider::no_session()));

        let response = server.get("/sign-in").add_cookie(session_cookie()).await;

        response.assert_status_ok();
        response.assert_text("nobody");
    }

    #[tokio::test]
    async fn provider_failure_redirects_instead_of_erroring() {
        let server = get_test_server(Arc::new(StubIdentityProvider::failing()));

        let response = server
            .get("/transaction/create")
            .add_cookie(session_cookie())
            .await;

        response.assert_status_see_other();
        assert_eq!(
            response.header("location"),
            "/sign-in?redirect=%2Ftransaction%2Fcreate"
        );
    }

    #[tokio::test]
    async fn unrestricted_route_is_served_without_lookup() {
        let provider = Arc::new(StubIdentityProvider::failing());
        let server = get_test_server(provider.clone());

        server.get("/").await.assert_status_ok();
        assert_eq!(provider.lookup_count(), 0);
    }

    #[tokio::test]
    async fn rotated_cookies_are_set_on_allowed_response() {
        let server = get_test_server(Arc::new(StubIdentityProvider::with_lookup(SessionLookup {
            user: Some(test_user()),
            cookies: vec![Cookie::new(SESSION_COOKIE, "rotated")],
        })));

        let response = server.get("/dashboard").add_cookie(session_cookie()).await;

        response.assert_status_ok();
        assert_eq!(response.cookie(SESSION_COOKIE).value(), "rotated");
    }

    #[tokio::test]
    async fn rotated_cookies_are_set_on_redirect() {
        let server = get_test_server(Arc::new(StubIdentityProvider::with_lookup(SessionLookup {
            user: Some(test_user()),
            cookies: vec![Cookie::new(SESSION_COOKIE, "rotated")],
        })));

        let response = server.get("/sign-in").add_cookie(session_cookie()).await;

        response.assert_status_see_other();
        assert_eq!(response.cookie(SESSION_COOKIE).value(), "rotated");
    }

    #[tokio::test]
    async fn htmx_request_gets_hx_redirect() {
        let server = get_test_server(Arc::new(StubIdentityProvider::no_session()));
        let current_url = "https://pesatrack.example/account/42?range=month";

        let response = server
            .get("/transaction/create")
            .add_header("HX-Request", "true")
            .add_header("HX-Current-URL", current_url)
            .await;

        response.assert_status_ok();
        assert_eq!(
            response.header("hx-redirect"),
            "/sign-in?redirect=%2Faccount%2F42%3Frange%3Dmonth"
        );
    }
}
