//! A client for a GoTrue-compatible identity provider (e.g. Supabase Auth).
//!
//! The gate only needs two things from the provider: "who owns this access
//! token?" and "swap this refresh token for a new session". Sign out is
//! offered for the sign-out endpoint.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    config::IdentityProviderConfig,
    cookie::{expired_session_cookie, session_cookie},
    session::{Credentials, IdentityProvider, SessionLookup, SessionUser},
};

const USER_PATH: &str = "/auth/v1/user";
const REFRESH_PATH: &str = "/auth/v1/token?grant_type=refresh_token";
const LOGOUT_PATH: &str = "/auth/v1/logout";

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    user: SessionUser,
}

/// Verifies sessions against the provider's REST API.
#[derive(Debug, Clone)]
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    access_token_cookie: String,
    refresh_token_cookie: String,
    session_cookie_max_age: time::Duration,
}

impl HttpIdentityProvider {
    /// Create a client from `config`.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - [Error::InvalidProviderUrl] if the base URL is not an absolute HTTP(S) URL.
    /// - [Error::HttpClient] if the HTTP client cannot be built.
    pub fn new(config: IdentityProviderConfig) -> Result<Self, Error> {
        let base_url = config.base_url.trim_end_matches('/').to_owned();
        let parsed = reqwest::Url::parse(&base_url)
            .map_err(|error| Error::InvalidProviderUrl(base_url.clone(), error.to_string()))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::InvalidProviderUrl(
                base_url,
                "the scheme must be http or https".to_owned(),
            ));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|error| Error::HttpClient(error.to_string()))?;

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key,
            access_token_cookie: config.access_token_cookie,
            refresh_token_cookie: config.refresh_token_cookie,
            session_cookie_max_age: config.session_cookie_max_age,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Fetch the user that owns `access_token`.
    ///
    /// Returns `Ok(None)` if the provider rejects the token, e.g. because it
    /// has expired.
    async fn get_user(&self, access_token: &str) -> Result<Option<SessionUser>, Error> {
        let response = self
            .client
            .get(self.endpoint(USER_PATH))
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|error| Error::ProviderUnreachable(error.to_string()))?;

        match response.status() {
            status if status.is_success() => response
                .json::<SessionUser>()
                .await
                .map(Some)
                .map_err(|error| Error::MalformedProviderResponse(error.to_string())),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            status => Err(Error::ProviderStatus(status.as_u16())),
        }
    }

    /// Exchange `refresh_token` for a new session.
    ///
    /// Returns `Ok(None)` if the provider rejects the refresh token.
    async fn refresh_session(&self, refresh_token: &str) -> Result<Option<TokenResponse>, Error> {
        let response = self
            .client
            .post(self.endpoint(REFRESH_PATH))
            .header("apikey", &self.api_key)
            .json(&RefreshRequest { refresh_token })
            .send()
            .await
            .map_err(|error| Error::ProviderUnreachable(error.to_string()))?;

        match response.status() {
            status if status.is_success() => response
                .json::<TokenResponse>()
                .await
                .map(Some)
                .map_err(|error| Error::MalformedProviderResponse(error.to_string())),
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => Ok(None),
            status => Err(Error::ProviderStatus(status.as_u16())),
        }
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    fn token_cookie_names(&self) -> (&str, &str) {
        (&self.access_token_cookie, &self.refresh_token_cookie)
    }

    async fn lookup(&self, credentials: &Credentials) -> Result<SessionLookup, Error> {
        if let Some(access_token) = &credentials.access_token {
            if let Some(user) = self.get_user(access_token).await? {
                return Ok(SessionLookup::user(user));
            }

            tracing::debug!("Access token rejected by the identity provider.");
        }

        let Some(refresh_token) = &credentials.refresh_token else {
            return Ok(SessionLookup::no_session());
        };

        match self.refresh_session(refresh_token).await? {
            Some(tokens) => {
                tracing::debug!("Refreshed session for user {}.", tokens.user.id);

                Ok(SessionLookup {
                    user: Some(tokens.user),
                    cookies: vec![
                        session_cookie(
                            &self.access_token_cookie,
                            &tokens.access_token,
                            self.session_cookie_max_age,
                        ),
                        session_cookie(
                            &self.refresh_token_cookie,
                            &tokens.refresh_token,
                            self.session_cookie_max_age,
                        ),
                    ],
                })
            }
            None => {
                tracing::debug!("Refresh token rejected by the identity provider.");

                Ok(SessionLookup {
                    user: None,
                    cookies: vec![
                        expired_session_cookie(&self.access_token_cookie),
                        expired_session_cookie(&self.refresh_token_cookie),
                    ],
                })
            }
        }
    }

    async fn sign_out(&self, credentials: &Credentials) -> Result<(), Error> {
        let Some(access_token) = &credentials.access_token else {
            return Ok(());
        };

        let response = self
            .client
            .post(self.endpoint(LOGOUT_PATH))
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|error| Error::ProviderUnreachable(error.to_string()))?;

        match response.status() {
            // An expired token means there is nothing left to revoke.
            status if status.is_success() || status == StatusCode::UNAUTHORIZED => Ok(()),
            status => Err(Error::ProviderStatus(status.as_u16())),
        }
    }
}
