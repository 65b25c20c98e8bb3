//! # `localStorage` auth store
//!
//! [`LocalAuthStore`] keeps the credentials under a single `localStorage` key
//! (`"icebyte_auth"`) as JSON. All failures (storage disabled,
//! quota, corrupt value) degrade to "no credentials".

use crate::auth_store::AuthStore;
use crate::models::AuthCredentials;

const DEFAULT_KEY: &str = "icebyte_auth";

#[derive(Clone, Debug)]
pub struct LocalAuthStore {
    key: String,
}

impl Default for LocalAuthStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalAuthStore {
    pub fn new() -> Self {
        Self {
            key: DEFAULT_KEY.to_string(),
        }
    }

    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()?.local_storage().ok()?
    }
}

impl AuthStore for LocalAuthStore {
    fn load(&self) -> Option<AuthCredentials> {
        let text = Self::storage()?.get_item(&self.key).ok()??;
        match serde_json::from_str(&text) {
            Ok(credentials) => Some(credentials),
            Err(e) => {
                tracing::warn!("Ignoring unreadable stored credentials: {}", e);
                None
            }
        }
    }

    fn save(&self, credentials: &AuthCredentials) {
        let Some(storage) = Self::storage() else {
            tracing::warn!("localStorage unavailable; session will not persist");
            return;
        };
        if let Ok(text) = serde_json::to_string(credentials) {
            let _ = storage.set_item(&self.key, &text);
        }
    }

    fn clear(&self) {
        if let Some(storage) = Self::storage() {
            let _ = storage.remove_item(&self.key);
        }
    }
}
