//! Sign-out route handler that revokes the session and clears its cookies.

use axum::{
    extract::{Request, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;

use crate::{AccessGate, cookie::invalidate_session_cookies, endpoints};

/// Revoke the session with the identity provider, delete the session cookies
/// and redirect the client to the landing page.
///
/// The cookies are cleared even if the provider cannot be reached.
pub async fn get_sign_out(State(gate): State<AccessGate>, request: Request) -> Response {
    let (parts, _) = request.into_parts();
    let credentials = gate.credentials(&parts);

    if let Err(error) = gate.provider().sign_out(&credentials).await {
        tracing::warn!("Could not revoke session with the identity provider: {error}");
    }

    let (access_token_cookie, refresh_token_cookie) = gate.provider().token_cookie_names();
    let jar = invalidate_session_cookies(
        CookieJar::from_headers(&parts.headers),
        access_token_cookie,
        refresh_token_cookie,
    );

    (jar, Redirect::to(endpoints::ROOT)).into_response()
}

#[cfg(test)]
mod sign_out_tests {
    use std::{sync::Arc, time::Duration};

    use axum::{Router, routing::get};
    use axum_extra::extract::cookie::Cookie;
    use axum_test::TestServer;

    use crate::{
        AccessGate, RoutePolicy,
        config::GateConfig,
        endpoints,
        session::IdentityProvider,
        sign_out::get_sign_out,
        test_utils::{StubIdentityProvider, test_user},
    };

    fn get_test_server(provider: Arc<dyn IdentityProvider>) -> TestServer {
        let gate = AccessGate::new(
            RoutePolicy::new(GateConfig::default()).unwrap(),
            provider,
            Duration::from_secs(1),
        );
        let app = Router::new()
            .route(endpoints::SIGN_OUT, get(get_sign_out))
            .with_state(gate);

        TestServer::new(app).expect("Could not create test server.")
    }

    #[track_caller]
    fn assert_cookies_cleared(response: &axum_test::TestResponse) {
        for name in ["sb-access-token", "sb-refresh-token"] {
            let cookie = response.cookie(name);
            assert_eq!(cookie.value(), "");
            assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
        }
    }

    #[tokio::test]
    async fn sign_out_clears_cookies_and_redirects_home() {
        let provider = Arc::new(StubIdentityProvider::with_user(test_user()));
        let server = get_test_server(provider.clone());

        let response = server
            .get(endpoints::SIGN_OUT)
            .add_cookie(Cookie::new("sb-access-token", "valid"))
            .add_cookie(Cookie::new("sb-refresh-token", "refresh"))
            .await;

        response.assert_status_see_other();
        assert_eq!(response.header("location"), endpoints::ROOT);
        assert_cookies_cleared(&response);
        assert_eq!(provider.sign_out_count(), 1);
    }

    #[tokio::test]
    async fn sign_out_clears_cookies_when_provider_fails() {
        let server = get_test_server(Arc::new(StubIdentityProvider::failing()));

        let response = server
            .get(endpoints::SIGN_OUT)
            .add_cookie(Cookie::new("sb-access-token", "valid"))
            .await;

        response.assert_status_see_other();
        assert_cookies_cleared(&response);
    }
}
