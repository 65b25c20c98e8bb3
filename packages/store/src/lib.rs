pub mod auth_store;
pub mod config;
pub mod models;

mod memory;
pub use memory::MemoryAuthStore;

#[cfg(not(target_arch = "wasm32"))]
mod file_store;
#[cfg(not(target_arch = "wasm32"))]
pub use file_store::FileAuthStore;

#[cfg(all(target_arch = "wasm32", feature = "web"))]
mod local;
#[cfg(all(target_arch = "wasm32", feature = "web"))]
pub use local::LocalAuthStore;

pub use auth_store::AuthStore;
pub use config::{BackendConfig, ClientConfig, ConfigError, UploadPolicy};
pub use models::{AuthCredentials, ImageSlot, UserRecord};
