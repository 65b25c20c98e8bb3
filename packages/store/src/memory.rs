use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::auth_store::AuthStore;
use crate::models::AuthCredentials;

/// In-memory AuthStore for testing and as a fallback when nothing can be persisted.
#[derive(Clone, Debug, Default)]
pub struct MemoryAuthStore {
    credentials: Arc<Mutex<Option<AuthCredentials>>>,
}

impl MemoryAuthStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with credentials already stored, as if a previous session left them.
    pub fn with_credentials(credentials: AuthCredentials) -> Self {
        Self {
            credentials: Arc::new(Mutex::new(Some(credentials))),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<AuthCredentials>> {
        self.credentials.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AuthStore for MemoryAuthStore {
    fn load(&self) -> Option<AuthCredentials> {
        self.slot().clone()
    }

    fn save(&self, credentials: &AuthCredentials) {
        *self.slot() = Some(credentials.clone());
    }

    fn clear(&self) {
        *self.slot() = None;
    }
}
