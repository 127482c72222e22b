//! Implements a struct that holds the state of the server.

use std::sync::Arc;

use crate::{
    Error,
    config::{GateConfig, IdentityProviderConfig},
    gate::AccessGate,
    identity_provider::HttpIdentityProvider,
    policy::RoutePolicy,
};

/// The state of the server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The access gate that guards every route.
    pub gate: AccessGate,
}

impl AppState {
    /// Create a new [AppState] that verifies sessions with the identity
    /// provider described by `provider_config`.
    ///
    /// `lookup_timeout` bounds each session lookup; slower lookups are
    /// treated as signed out.
    ///
    /// # Errors
    /// Returns an error if `gate_config` is not a valid route policy or the
    /// identity provider client cannot be created.
    pub fn new(
        gate_config: GateConfig,
        provider_config: IdentityProviderConfig,
        lookup_timeout: std::time::Duration,
    ) -> Result<Self, Error> {
        let policy = RoutePolicy::new(gate_config)?;
        let provider = HttpIdentityProvider::new(provider_config)?;

        Ok(Self {
            gate: AccessGate::new(policy, Arc::new(provider), lookup_timeout),
        })
    }
}
