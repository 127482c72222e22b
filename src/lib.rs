//! PesaTrack is a web app for tracking personal finances.
//!
//! This library provides the access gate that sits in front of every page:
//! it decides, per request, whether the caller may see a route, must sign in
//! first, or is already signed in and should be sent on to the app. Sessions
//! are verified with a hosted identity provider on each request.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod app_state;
mod config;
mod cookie;
mod endpoints;
mod gate;
mod html;
mod identity_provider;
mod logging;
mod policy;
mod redirect;
mod routing;
mod session;
mod sign_out;
mod views;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use config::{GateConfig, IdentityProviderConfig, request_timeout_for_lookup};
pub use gate::{AccessGate, Decision, GateOutcome, access_gate};
pub use identity_provider::HttpIdentityProvider;
pub use logging::logging_middleware;
pub use policy::{RouteCategory, RoutePolicy};
pub use routing::build_router;
pub use session::{Credentials, IdentityProvider, SessionEvidence, SessionLookup, SessionUser};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("Could not listen for the ctrl+c signal: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                tracing::error!("Could not listen for the terminate signal: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
        },
    }

    handle.graceful_shutdown(Some(Duration::from_secs(1)));
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A route prefix, sign-in path or landing path was empty or did not
    /// start with a forward slash.
    #[error("route path \"{0}\" must be a non-empty path starting with '/'")]
    InvalidRoutePrefix(String),

    /// A protected prefix and an auth-only prefix match some of the same
    /// paths.
    #[error("protected prefix \"{protected}\" overlaps auth-only prefix \"{auth_only}\"")]
    OverlappingRoutePrefixes {
        /// The offending protected prefix.
        protected: String,
        /// The offending auth-only prefix.
        auth_only: String,
    },

    /// The sign-in page would itself require a session.
    #[error("the sign-in path \"{0}\" must not be a protected route")]
    ProtectedSignInPath(String),

    /// The landing page for signed in users is an auth-only route.
    #[error("the landing path \"{0}\" must not be an auth-only route")]
    AuthOnlyLandingPath(String),

    /// The identity provider base URL could not be parsed.
    ///
    /// Callers should pass in the offending URL and the parse error as a string.
    #[error("invalid identity provider URL \"{0}\": {1}")]
    InvalidProviderUrl(String, String),

    /// The HTTP client for the identity provider could not be built.
    #[error("could not build the identity provider HTTP client: {0}")]
    HttpClient(String),

    /// The identity provider could not be reached, e.g. a connection error or
    /// the client's own timeout.
    #[error("could not reach the identity provider: {0}")]
    ProviderUnreachable(String),

    /// The identity provider answered with a status code the client does not
    /// know how to handle.
    #[error("the identity provider responded with status {0}")]
    ProviderStatus(u16),

    /// The identity provider's response body could not be parsed.
    #[error("could not parse the identity provider response: {0}")]
    MalformedProviderResponse(String),

    /// The session lookup did not finish within the gate's time limit.
    #[error("the session lookup did not complete within {0:?}")]
    SessionLookupTimeout(Duration),
}
