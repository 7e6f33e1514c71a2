//! Auth session abstraction
//!
//! Credential state has process-wide lifecycle: set at login, read by every
//! authenticated call, cleared at logout or auth failure. Wrapping it behind
//! a provider trait keeps the rest of the core testable with a fake session.

use crate::model::Role;
use std::sync::Mutex;

/// Credentials stored for the logged-in user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Bearer token attached to every request
    pub token: String,
    /// Current user id
    pub user_id: String,
    /// Current user role, selects the API path prefix
    pub role: Role,
}

/// Source of the current session's credentials
pub trait SessionProvider: Send + Sync {
    /// Bearer token, if logged in
    fn token(&self) -> Option<String>;
    /// Current user id, if logged in
    fn user_id(&self) -> Option<String>;
    /// Current user role, if logged in
    fn role(&self) -> Option<Role>;
    /// Drop stored credentials (logout or rejected token)
    fn clear(&self);
}

/// In-memory session provider
pub struct MemorySession {
    credentials: Mutex<Option<Credentials>>,
}

impl MemorySession {
    /// Create an empty (logged-out) session
    pub fn new() -> Self {
        Self {
            credentials: Mutex::new(None),
        }
    }

    /// Create a session already holding credentials
    pub fn logged_in(credentials: Credentials) -> Self {
        Self {
            credentials: Mutex::new(Some(credentials)),
        }
    }

    /// Store credentials after a successful login
    pub fn set(&self, credentials: Credentials) {
        let mut guard = self.credentials.lock().unwrap();
        *guard = Some(credentials);
    }
}

impl Default for MemorySession {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionProvider for MemorySession {
    fn token(&self) -> Option<String> {
        self.credentials.lock().unwrap().as_ref().map(|c| c.token.clone())
    }

    fn user_id(&self) -> Option<String> {
        self.credentials
            .lock()
            .unwrap()
            .as_ref()
            .map(|c| c.user_id.clone())
    }

    fn role(&self) -> Option<Role> {
        self.credentials.lock().unwrap().as_ref().map(|c| c.role)
    }

    fn clear(&self) {
        let mut guard = self.credentials.lock().unwrap();
        if guard.take().is_some() {
            tracing::info!("Session credentials cleared");
        }
    }
}
