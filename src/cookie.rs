//! Builders for the cookies that carry the identity provider's session tokens.

use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use time::{Duration, OffsetDateTime};

/// Build a cookie holding a session token.
///
/// The cookie is sent on every path, is hidden from scripts and is only sent
/// over HTTPS. `SameSite=Lax` lets the provider's sign-in redirect carry it.
pub(crate) fn session_cookie(name: &str, value: &str, max_age: Duration) -> Cookie<'static> {
    Cookie::build((name.to_owned(), value.to_owned()))
        .path("/")
        .max_age(max_age)
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(true)
        .build()
}

/// Build a cookie that tells the browser to delete the session cookie `name`.
pub(crate) fn expired_session_cookie(name: &str) -> Cookie<'static> {
    Cookie::build((name.to_owned(), String::new()))
        .path("/")
        .expires(OffsetDateTime::UNIX_EPOCH)
        .max_age(Duration::ZERO)
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(true)
        .build()
}

/// Add expired versions of the access and refresh token cookies to `jar`,
/// which deletes them on the client side.
pub(crate) fn invalidate_session_cookies(
    jar: CookieJar,
    access_token_cookie: &str,
    refresh_token_cookie: &str,
) -> CookieJar {
    jar.add(expired_session_cookie(access_token_cookie))
        .add(expired_session_cookie(refresh_token_cookie))
}
