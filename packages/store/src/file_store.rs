//! # Filesystem-backed auth store
//!
//! [`FileAuthStore`] persists the current [`AuthCredentials`] as a single JSON
//! file. It is used on native targets so a login survives app restarts.
//!
//! ## Platform config directories
//!
//! [`FileAuthStore::default_location`] resolves to `<config_dir>/icebyte/auth.json`:
//!
//! | Platform | Path |
//! |----------|------|
//! | macOS | `~/Library/Application Support/icebyte/auth.json` |
//! | Linux | `~/.config/icebyte/auth.json` |
//! | Windows | `C:\Users\<user>\AppData\Roaming\icebyte\auth.json` |
//!
//! Unreadable or corrupt files are treated as "logged out".

use std::path::PathBuf;

use crate::auth_store::AuthStore;
use crate::models::AuthCredentials;

const FILE_NAME: &str = "auth.json";

#[derive(Clone, Debug)]
pub struct FileAuthStore {
    path: PathBuf,
}

impl FileAuthStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store in the platform config directory, or the working directory if
    /// none can be determined.
    pub fn default_location() -> Self {
        let base = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("icebyte");
        Self::new(base.join(FILE_NAME))
    }
}

impl AuthStore for FileAuthStore {
    fn load(&self) -> Option<AuthCredentials> {
        let text = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&text) {
            Ok(credentials) => Some(credentials),
            Err(e) => {
                tracing::warn!("Ignoring unreadable auth file {}: {}", self.path.display(), e);
                None
            }
        }
    }

    fn save(&self, credentials: &AuthCredentials) {
        if let Some(parent) = self.path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match serde_json::to_string(credentials) {
            Ok(text) => {
                if let Err(e) = std::fs::write(&self.path, text) {
                    tracing::error!("Failed to write auth file {}: {}", self.path.display(), e);
                }
            }
            Err(e) => tracing::error!("Failed to serialize credentials: {}", e),
        }
    }

    fn clear(&self) {
        let _ = std::fs::remove_file(&self.path);
    }
}
