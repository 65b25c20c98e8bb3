//! Platform-appropriate backend constructor.
//!
//! Returns an [`api::Backend`] whose credentials persist in:
//! - **Web** (WASM + `web` feature): `localStorage` via [`store::LocalAuthStore`]
//! - **Native**: a JSON file via [`store::FileAuthStore`]
//!
//! A backend URL of `memory` selects [`api::MemoryBackend`] instead, for
//! running the UI without a server.

use std::rc::Rc;

use api::{Backend, MemoryBackend, PocketBaseClient};
use store::{AuthStore, ClientConfig};

use crate::session::AuthService;

/// `backend.url` value that selects the in-memory backend.
pub const MEMORY_BACKEND_URL: &str = "memory";

pub fn make_backend(config: &ClientConfig) -> Rc<dyn Backend> {
    if config.backend.url == MEMORY_BACKEND_URL {
        tracing::info!("Using in-memory backend");
        return Rc::new(MemoryBackend::new());
    }
    tracing::info!("Using backend at {}", config.backend.url);
    Rc::new(PocketBaseClient::new(&config.backend, auth_store()))
}

fn auth_store() -> Box<dyn AuthStore> {
    #[cfg(all(target_arch = "wasm32", feature = "web"))]
    {
        Box::new(store::LocalAuthStore::new())
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        Box::new(store::FileAuthStore::default_location())
    }
    #[cfg(all(target_arch = "wasm32", not(feature = "web")))]
    {
        Box::new(store::MemoryAuthStore::new())
    }
}

/// Build the service from `icebyte.toml` and the environment. A broken
/// config file is logged and replaced by the defaults.
pub fn make_service() -> AuthService {
    let config = ClientConfig::load().unwrap_or_else(|e| {
        tracing::warn!("Falling back to default config: {}", e);
        ClientConfig::default()
    });
    AuthService::new(make_backend(&config), config.uploads)
}
