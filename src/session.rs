//! Credentials for the authenticated operator.
//!
//! A `Session` is created by the embedding application and handed to the
//! transport. It is filled on login and emptied on logout; nothing is kept
//! in process-wide storage.

use std::sync::{Arc, PoisonError, RwLock};

/// Access/refresh token pair issued by the auth endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access: String,
    pub refresh: Option<String>,
}

impl Credentials {
    pub fn new(access: impl Into<String>, refresh: Option<String>) -> Self {
        Self {
            access: access.into(),
            refresh,
        }
    }
}

/// Shared handle to the current credentials. Clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct Session {
    credentials: Arc<RwLock<Option<Credentials>>>,
}

impl Session {
    /// Create an empty (logged out) session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session that is already logged in.
    pub fn with_credentials(credentials: Credentials) -> Self {
        let session = Self::new();
        session.acquire(credentials);
        session
    }

    /// Store freshly issued credentials.
    pub fn acquire(&self, credentials: Credentials) {
        *self
            .credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(credentials);
    }

    /// Replace the access token after a refresh, keeping the refresh token.
    pub fn set_access(&self, access: impl Into<String>) {
        let mut guard = self
            .credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        match guard.as_mut() {
            Some(credentials) => credentials.access = access.into(),
            None => *guard = Some(Credentials::new(access, None)),
        }
    }

    /// Forget all credentials.
    pub fn clear(&self) {
        *self
            .credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token().is_some()
    }

    pub fn access_token(&self) -> Option<String> {
        self.credentials
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|c| c.access.clone())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.credentials
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(|c| c.refresh.clone())
    }
}
