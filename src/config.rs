//! Configuration for the access gate and the identity provider client.
//!
//! Both structs are plain data: build them once at start-up (the server binary
//! fills them in from command line arguments and environment variables), validate
//! them by constructing a [RoutePolicy](crate::RoutePolicy) and an
//! [HttpIdentityProvider](crate::HttpIdentityProvider), and never touch them again.

use std::time::Duration;

use crate::endpoints;

/// The default cookie holding the provider's access token.
pub const DEFAULT_ACCESS_TOKEN_COOKIE: &str = "sb-access-token";
/// The default cookie holding the provider's refresh token.
pub const DEFAULT_REFRESH_TOKEN_COOKIE: &str = "sb-refresh-token";
/// How long the gate waits for the identity provider before giving up.
pub const DEFAULT_SESSION_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);
/// How long rotated session cookies live in the browser.
pub const DEFAULT_SESSION_COOKIE_MAX_AGE: time::Duration = time::Duration::days(7);

/// The route policy as it is configured, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct GateConfig {
    /// Path prefixes that require a verified session.
    pub protected_prefixes: Vec<String>,
    /// Path prefixes that signed in users should not see, e.g. the sign-in page.
    pub auth_only_prefixes: Vec<String>,
    /// Where visitors without a session are sent.
    pub sign_in_path: String,
    /// Where signed in users are sent when they visit an auth-only page
    /// without a `redirect` query parameter.
    pub default_landing_path: String,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            protected_prefixes: vec![
                endpoints::DASHBOARD_VIEW.to_owned(),
                "/account".to_owned(),
                "/transaction".to_owned(),
            ],
            auth_only_prefixes: vec![
                endpoints::SIGN_IN_VIEW.to_owned(),
                endpoints::SIGN_UP_VIEW.to_owned(),
            ],
            sign_in_path: endpoints::SIGN_IN_VIEW.to_owned(),
            default_landing_path: endpoints::DASHBOARD_VIEW.to_owned(),
        }
    }
}

/// Connection details for a GoTrue-compatible identity provider.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityProviderConfig {
    /// The provider's base URL, e.g. "https://project.supabase.co".
    pub base_url: String,
    /// The public API key sent in the `apikey` header.
    pub api_key: String,
    /// The name of the cookie holding the access token.
    pub access_token_cookie: String,
    /// The name of the cookie holding the refresh token.
    pub refresh_token_cookie: String,
    /// The max age of session cookies set after a token refresh.
    pub session_cookie_max_age: time::Duration,
    /// Timeout for establishing a connection to the provider.
    pub connect_timeout: Duration,
    /// Timeout for a whole request to the provider.
    pub request_timeout: Duration,
}

impl IdentityProviderConfig {
    /// Create a config for the provider at `base_url` with default cookie
    /// names and timeouts.
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            base_url: base_url.to_owned(),
            api_key: api_key.to_owned(),
            access_token_cookie: DEFAULT_ACCESS_TOKEN_COOKIE.to_owned(),
            refresh_token_cookie: DEFAULT_REFRESH_TOKEN_COOKIE.to_owned(),
            session_cookie_max_age: DEFAULT_SESSION_COOKIE_MAX_AGE,
            connect_timeout: Duration::from_secs(2),
            request_timeout: request_timeout_for_lookup(DEFAULT_SESSION_LOOKUP_TIMEOUT),
        }
    }
}

/// The per-request timeout for the identity provider client when the gate
/// allows `lookup_timeout` for a whole session lookup.
///
/// A lookup with an expired access token makes two requests in a row (user,
/// then refresh), so each gets 40% of the budget. A slow refresh then fails
/// on its own timeout instead of being cut off by the gate after the provider
/// has already rotated the tokens.
pub fn request_timeout_for_lookup(lookup_timeout: Duration) -> Duration {
    lookup_timeout * 2 / 5
}
