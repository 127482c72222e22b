//! The route policy: which paths need a session, which are only for signed
//! out visitors, and which are open to everyone.

use crate::{Error, config::GateConfig, endpoints};

/// The category a request path falls into under a [RoutePolicy].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteCategory {
    /// The route requires a verified session.
    Protected,
    /// The route is only for visitors without a session, e.g. the sign-in page.
    AuthOnly,
    /// Anyone may access the route.
    Unrestricted,
}

/// A validated, read-only table of route prefixes.
///
/// Build it once at start-up with [RoutePolicy::new] and share it; nothing
/// mutates it afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutePolicy {
    protected: Vec<String>,
    auth_only: Vec<String>,
    sign_in_path: String,
    default_landing_path: String,
}

impl RoutePolicy {
    /// Validate `config` and build the policy from it.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - [Error::InvalidRoutePrefix] if any prefix or path is empty or does not start with '/'.
    /// - [Error::OverlappingRoutePrefixes] if a protected prefix and an auth-only prefix
    ///   could both match the same path.
    /// - [Error::ProtectedSignInPath] if the sign-in path is itself protected.
    /// - [Error::AuthOnlyLandingPath] if the landing path is auth-only.
    pub fn new(config: GateConfig) -> Result<Self, Error> {
        let GateConfig {
            protected_prefixes,
            auth_only_prefixes,
            sign_in_path,
            default_landing_path,
        } = config;

        for path in protected_prefixes
            .iter()
            .chain(&auth_only_prefixes)
            .chain([&sign_in_path, &default_landing_path])
        {
            if !path.starts_with('/') {
                return Err(Error::InvalidRoutePrefix(path.to_owned()));
            }
        }

        for protected in &protected_prefixes {
            for auth_only in &auth_only_prefixes {
                if protected.starts_with(auth_only.as_str())
                    || auth_only.starts_with(protected.as_str())
                {
                    return Err(Error::OverlappingRoutePrefixes {
                        protected: protected.to_owned(),
                        auth_only: auth_only.to_owned(),
                    });
                }
            }
        }

        let policy = Self {
            protected: protected_prefixes,
            auth_only: auth_only_prefixes,
            sign_in_path,
            default_landing_path,
        };

        if policy.classify(&policy.sign_in_path) == RouteCategory::Protected {
            return Err(Error::ProtectedSignInPath(policy.sign_in_path));
        }

        if policy.classify(&policy.default_landing_path) == RouteCategory::AuthOnly {
            return Err(Error::AuthOnlyLandingPath(policy.default_landing_path));
        }

        Ok(policy)
    }

    /// Decide which category `path` falls into.
    ///
    /// Auth-only prefixes are checked before protected ones. Static assets
    /// are always unrestricted.
    pub fn classify(&self, path: &str) -> RouteCategory {
        if is_static_asset(path) {
            return RouteCategory::Unrestricted;
        }

        if matches_any(path, &self.auth_only) {
            RouteCategory::AuthOnly
        } else if matches_any(path, &self.protected) {
            RouteCategory::Protected
        } else {
            RouteCategory::Unrestricted
        }
    }

    /// The path of the sign-in page.
    pub fn sign_in_path(&self) -> &str {
        &self.sign_in_path
    }

    /// Where signed in users go when they have nowhere better to be.
    pub fn default_landing_path(&self) -> &str {
        &self.default_landing_path
    }
}

fn matches_any(path: &str, prefixes: &[String]) -> bool {
    prefixes.iter().any(|prefix| path.starts_with(prefix.as_str()))
}

/// Whether `path` is served from the static file mount, which the gate never
/// checks.
///
/// Only the mount itself counts: a file-like last segment under a protected
/// prefix, e.g. `/account/123.png`, is still gated.
fn is_static_asset(path: &str) -> bool {
    path.strip_prefix(endpoints::STATIC)
        .is_some_and(|rest| rest.starts_with('/'))
}
