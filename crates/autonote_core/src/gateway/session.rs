//! Bearer credential shared between the gateway and the host application.
//!
//! # Invariants
//! - Blank tokens are treated as absent.
//! - The token value is never rendered by `Debug`.

use std::fmt::{Debug, Formatter};
use std::sync::{Arc, PoisonError, RwLock};

/// Cloneable handle to the current session credential.
///
/// Clones share state, so an invalidation by the gateway (on 401) is visible
/// to the application that owns the session.
#[derive(Clone, Default)]
pub struct Session {
    token: Arc<RwLock<Option<String>>>,
}

impl Session {
    /// Creates an authenticated session.
    pub fn new(token: impl Into<String>) -> Self {
        let session = Self::default();
        session.replace(token);
        session
    }

    /// Creates a session with no credential.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Stores a new credential; blank input clears the session.
    pub fn replace(&self, token: impl Into<String>) {
        let token = token.into();
        let normalized = Some(token.trim().to_string()).filter(|value| !value.is_empty());
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = normalized;
    }

    /// Drops the credential.
    pub fn invalidate(&self) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl Debug for Session {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}
