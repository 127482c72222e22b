use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;

use crate::{
    Error,
    config::{DEFAULT_ACCESS_TOKEN_COOKIE, DEFAULT_REFRESH_TOKEN_COOKIE},
    session::{Credentials, IdentityProvider, SessionLookup, SessionUser},
};

pub(crate) fn test_user() -> SessionUser {
    SessionUser {
        id: "8d0f6c1e-2a4b-4c3d-9e5f-0a1b2c3d4e5f".to_owned(),
        email: Some("test@pesatrack.example".to_owned()),
    }
}

#[derive(Debug)]
enum Behaviour {
    Answer(SessionLookup),
    Fail,
    Hang,
}

/// An identity provider that answers every lookup the same way and counts
/// how often it was asked.
#[derive(Debug)]
pub(crate) struct StubIdentityProvider {
    behaviour: Behaviour,
    lookups: AtomicUsize,
    sign_outs: AtomicUsize,
}

impl StubIdentityProvider {
    fn new(behaviour: Behaviour) -> Self {
        Self {
            behaviour,
            lookups: AtomicUsize::new(0),
            sign_outs: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_user(user: SessionUser) -> Self {
        Self::new(Behaviour::Answer(SessionLookup::user(user)))
    }

    pub(crate) fn with_lookup(lookup: SessionLookup) -> Self {
        Self::new(Behaviour::Answer(lookup))
    }

    pub(crate) fn no_session() -> Self {
        Self::new(Behaviour::Answer(SessionLookup::no_session()))
    }

    pub(crate) fn failing() -> Self {
        Self::new(Behaviour::Fail)
    }

    pub(crate) fn hanging() -> Self {
        Self::new(Behaviour::Hang)
    }

    pub(crate) fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub(crate) fn sign_out_count(&self) -> usize {
        self.sign_outs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for StubIdentityProvider {
    fn token_cookie_names(&self) -> (&str, &str) {
        (DEFAULT_ACCESS_TOKEN_COOKIE, DEFAULT_REFRESH_TOKEN_COOKIE)
    }

    async fn lookup(&self, _credentials: &Credentials) -> Result<SessionLookup, Error> {
        self.lookups.fetch_add(1, Ordering::SeqCst);

        match &self.behaviour {
            Behaviour::Answer(lookup) => Ok(lookup.clone()),
            Behaviour::Fail => Err(Error::ProviderUnreachable("connection refused".to_owned())),
            Behaviour::Hang => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(SessionLookup::no_session())
            }
        }
    }

    async fn sign_out(&self, _credentials: &Credentials) -> Result<(), Error> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);

        match &self.behaviour {
            Behaviour::Fail => Err(Error::ProviderUnreachable("connection refused".to_owned())),
            _ => Ok(()),
        }
    }
}
