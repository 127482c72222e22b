//! Session evidence: reading credentials off a request and asking the identity
//! provider whether they belong to a signed in user.

use std::time::Duration;

use async_trait::async_trait;
use axum::http::HeaderMap;
use axum_extra::{
    extract::{CookieJar, cookie::Cookie},
    headers::{Authorization, HeaderMapExt, authorization::Bearer},
};
use serde::{Deserialize, Serialize};

use crate::Error;

/// The credential material a request carries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// A short-lived token the identity provider can verify.
    pub access_token: Option<String>,
    /// A long-lived token that can be exchanged for a new access token.
    pub refresh_token: Option<String>,
}

impl Credentials {
    /// Read credentials from request headers.
    ///
    /// An `Authorization: Bearer` header takes precedence over the
    /// `access_token_cookie`. Empty values are treated as missing.
    pub fn from_headers(
        headers: &HeaderMap,
        access_token_cookie: &str,
        refresh_token_cookie: &str,
    ) -> Self {
        let jar = CookieJar::from_headers(headers);
        let cookie_value = |name: &str| {
            jar.get(name)
                .map(|cookie| cookie.value_trimmed().to_owned())
                .filter(|value| !value.is_empty())
        };

        let bearer_token = headers
            .typed_get::<Authorization<Bearer>>()
            .map(|authorization| authorization.token().to_owned())
            .filter(|token| !token.is_empty());

        Self {
            access_token: bearer_token.or_else(|| cookie_value(access_token_cookie)),
            refresh_token: cookie_value(refresh_token_cookie),
        }
    }

    /// Whether the request carries no credentials at all.
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }
}

/// A user as vouched for by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    /// The provider's ID for the user.
    pub id: String,
    /// The user's email address, if the provider shares it.
    #[serde(default)]
    pub email: Option<String>,
}

/// The result of asking the identity provider about a set of credentials.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionLookup {
    /// The verified user, or `None` if there is no valid session.
    pub user: Option<SessionUser>,
    /// Cookies the provider client wants set on the response, e.g. rotated
    /// tokens after a refresh or removals after a failed one.
    pub cookies: Vec<Cookie<'static>>,
}

impl SessionLookup {
    /// A lookup that found a user and has no cookies to set.
    pub fn user(user: SessionUser) -> Self {
        Self {
            user: Some(user),
            cookies: Vec::new(),
        }
    }

    /// A lookup that found no session and has no cookies to set.
    pub fn no_session() -> Self {
        Self::default()
    }
}

/// A service that can verify credentials, e.g. a hosted auth provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The names of the cookies that carry the access and refresh tokens.
    fn token_cookie_names(&self) -> (&str, &str);

    /// Exchange `credentials` for a verified user.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider could not give a definite answer, e.g.
    /// it was unreachable or sent back something unexpected. A definite "no
    /// session" is `Ok` with no user.
    async fn lookup(&self, credentials: &Credentials) -> Result<SessionLookup, Error>;

    /// Revoke the session behind `credentials`.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider could not be told about the sign out.
    async fn sign_out(&self, credentials: &Credentials) -> Result<(), Error>;
}

/// Whether the current request has a verified session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvidence {
    /// The identity provider vouched for this user.
    Authenticated(SessionUser),
    /// No credentials, invalid credentials, or the check failed.
    Anonymous,
}

/// Ask `provider` about `credentials`, giving up after `timeout`.
///
/// Never fails: any error or timeout is logged and treated as
/// [SessionEvidence::Anonymous]. The returned cookies should be set on the
/// response whatever the evidence turns out to be.
pub async fn derive_session_evidence(
    provider: &dyn IdentityProvider,
    credentials: &Credentials,
    timeout: Duration,
) -> (SessionEvidence, Vec<Cookie<'static>>) {
    if credentials.is_empty() {
        return (SessionEvidence::Anonymous, Vec::new());
    }

    let result = match tokio::time::timeout(timeout, provider.lookup(credentials)).await {
        Ok(result) => result,
        Err(_) => Err(Error::SessionLookupTimeout(timeout)),
    };

    match result {
        Ok(SessionLookup {
            user: Some(user),
            cookies,
        }) => (SessionEvidence::Authenticated(user), cookies),
        Ok(SessionLookup {
            user: None,
            cookies,
        }) => (SessionEvidence::Anonymous, cookies),
        Err(error) => {
            tracing::warn!("Session lookup failed, treating request as signed out: {error}");
            (SessionEvidence::Anonymous, Vec::new())
        }
    }
}
