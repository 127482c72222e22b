//! Helpers for redirect URLs during authentication flows.

use axum::http::{Uri, request::Parts};
use serde::Deserialize;
use tracing::{error, warn};

use crate::policy::{RouteCategory, RoutePolicy};

/// The query parameter that carries the page to return to after signing in.
pub const REDIRECT_PARAM: &str = "redirect";

#[derive(Debug, Deserialize)]
struct RedirectQuery {
    redirect: Option<String>,
}

/// Whether `redirect_url` is a local path that is safe to send a browser to.
///
/// Protocol-relative URLs (`//host` and the `/\host` form browsers treat the
/// same way) are rejected, as are auth-only pages, which would bounce a signed
/// in user straight back.
fn is_safe_redirect_url(redirect_url: &str, policy: &RoutePolicy) -> bool {
    if !redirect_url.starts_with('/')
        || redirect_url.starts_with("//")
        || redirect_url.starts_with("/\\")
    {
        return false;
    }

    let path = redirect_url
        .split_once('?')
        .map(|(path, _)| path)
        .unwrap_or(redirect_url);

    policy.classify(path) != RouteCategory::AuthOnly
}

/// Reduce `raw_url` to a safe local path and query, or `None` if it points
/// anywhere else.
pub fn normalize_redirect_url(raw_url: &str, policy: &RoutePolicy) -> Option<String> {
    let uri = raw_url.parse::<Uri>().ok()?;
    if uri.scheme().is_some() || uri.authority().is_some() {
        return None;
    }
    let path_and_query = uri.path_and_query()?.as_str();

    is_safe_redirect_url(path_and_query, policy).then(|| path_and_query.to_owned())
}

/// HTMX reports the page the user is looking at as an absolute URL, so only
/// its path and query are kept.
fn normalize_hx_current_url(raw_url: &str, policy: &RoutePolicy) -> Option<String> {
    let uri = raw_url.parse::<Uri>().ok()?;
    let path_and_query = uri.path_and_query()?.as_str();

    is_safe_redirect_url(path_and_query, policy).then(|| path_and_query.to_owned())
}

/// Whether the request was sent by HTMX rather than a full page navigation.
pub fn is_hx_request(parts: &Parts) -> bool {
    parts
        .headers
        .get("hx-request")
        .and_then(|header| header.to_str().ok())
        .map(|header| header.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// The page the user should come back to after signing in.
///
/// For HTMX requests this is the page that issued the request, otherwise it
/// is the requested path and query.
pub fn redirect_intent(parts: &Parts, policy: &RoutePolicy) -> Option<String> {
    // A fragment request has no page of its own to return to, so HTMX
    // requests come back to the page that issued them, even when that page
    // is unrestricted.
    if is_hx_request(parts) {
        let current_url = parts
            .headers
            .get("hx-current-url")
            .and_then(|header| header.to_str().ok());

        match current_url.and_then(|url| normalize_hx_current_url(url, policy)) {
            Some(redirect_url) => return Some(redirect_url),
            None => warn!("Missing or invalid HX-Current-URL header. Using the request URI."),
        }
    }

    let path_and_query = parts.uri.path_and_query()?.as_str();
    normalize_redirect_url(path_and_query, policy)
}

/// Build the sign-in URL that remembers `redirect_target`, e.g.
/// "/sign-in?redirect=%2Fdashboard".
///
/// Falls back to the bare sign-in path if there is no target or it cannot be
/// encoded.
pub fn build_sign_in_redirect_url(policy: &RoutePolicy, redirect_target: Option<&str>) -> String {
    let Some(redirect_target) = redirect_target else {
        return policy.sign_in_path().to_owned();
    };

    match serde_urlencoded::to_string([(REDIRECT_PARAM, redirect_target)]) {
        Ok(param) => format!("{}?{}", policy.sign_in_path(), param),
        Err(error) => {
            error!("Could not encode redirect URL {redirect_target}: {error}");
            policy.sign_in_path().to_owned()
        }
    }
}

/// Where to send a signed in user who asked for an auth-only page.
///
/// Uses the request's `redirect` query parameter if it is a safe local path,
/// otherwise the policy's default landing path.
pub fn authenticated_landing_url(parts: &Parts, policy: &RoutePolicy) -> String {
    let requested = parts
        .uri
        .query()
        .and_then(|query| match serde_urlencoded::from_str::<RedirectQuery>(query) {
            Ok(query) => query.redirect,
            Err(error) => {
                warn!("Could not parse query string \"{query}\": {error}");
                None
            }
        });

    match requested {
        Some(raw_url) => normalize_redirect_url(&raw_url, policy).unwrap_or_else(|| {
            warn!("Ignoring unsafe redirect URL \"{raw_url}\".");
            policy.default_landing_path().to_owned()
        }),
        None => policy.default_landing_path().to_owned(),
    }
}
