//! Middleware for logging requests and responses.

use axum::{
    extract::Request,
    http::{
        HeaderMap, HeaderValue,
        header::{AUTHORIZATION, COOKIE, SET_COOKIE},
    },
    middleware::Next,
    response::Response,
};

const REDACTED: &str = "********";

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level. Credential
/// headers (`Cookie`, `Authorization` and `Set-Cookie`) are redacted so that
/// session tokens never reach the logs.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    tracing::info!(
        "Received request: {} {}\nheaders: {:#?}",
        request.method(),
        request.uri(),
        redact_credentials(request.headers())
    );

    let response = next.run(request).await;

    tracing::info!(
        "Sending response: {}\nheaders: {:#?}",
        response.status(),
        redact_credentials(response.headers())
    );

    response
}

/// Copy `headers`, replacing the values of credential headers.
fn redact_credentials(headers: &HeaderMap) -> HeaderMap {
    let mut redacted = headers.clone();

    for name in [COOKIE, AUTHORIZATION, SET_COOKIE] {
        let count = redacted.get_all(&name).iter().count();
        if count == 0 {
            continue;
        }

        redacted.remove(&name);
        for _ in 0..count {
            redacted.append(name.clone(), HeaderValue::from_static(REDACTED));
        }
    }

    redacted
}

#[cfg(test)]
mod logging_tests {
    use axum::{
        Router,
        http::{
            HeaderMap, HeaderValue,
            header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE},
        },
        middleware,
        routing::get,
    };
    use axum_test::TestServer;

    use super::{REDACTED, logging_middleware, redact_credentials};

    #[test]
    fn redacts_credential_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("sb-access-token=secret"));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer secret"));
        headers.append(SET_COOKIE, HeaderValue::from_static("a=1"));
        headers.append(SET_COOKIE, HeaderValue::from_static("b=2"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/html"));

        let got = redact_credentials(&headers);

        assert_eq!(got.get(COOKIE).unwrap(), REDACTED);
        assert_eq!(got.get(AUTHORIZATION).unwrap(), REDACTED);
        assert_eq!(got.get_all(SET_COOKIE).iter().count(), 2);
        assert!(got.get_all(SET_COOKIE).iter().all(|value| value == REDACTED));
        assert_eq!(got.get(CONTENT_TYPE).unwrap(), "text/html");
    }

    #[test]
    fn leaves_other_headers_alone() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let got = redact_credentials(&headers);

        assert_eq!(got, headers);
    }

    #[tokio::test]
    async fn middleware_passes_response_through() {
        let app = Router::new()
            .route("/", get(|| async { "hello" }))
            .layer(middleware::from_fn(logging_middleware));
        let server = TestServer::new(app).expect("Could not create test server.");

        let response = server.get("/").add_header("cookie", "sb-access-token=secret").await;

        response.assert_status_ok();
        response.assert_text("hello");
    }
}
