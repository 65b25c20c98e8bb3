//! # Client configuration (`icebyte.toml`)
//!
//! Where the backend lives and which uploads the profile editor accepts.
//!
//! ```toml
//! [backend]
//! url = "http://127.0.0.1:8090"
//! collection = "users"
//!
//! [uploads]
//! max_bytes = 12582912
//! allowed_extensions = ["png", "jpg", "jpeg", "gif", "webp"]
//! enforce = true
//! ```
//!
//! Every section is defaulted, so a missing or empty file equals
//! [`ClientConfig::default`]. [`ClientConfig::load`] additionally honours the
//! `ICEBYTE_BACKEND_URL` environment variable.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable overriding `backend.url`.
pub const BACKEND_URL_ENV: &str = "ICEBYTE_BACKEND_URL";

/// Upper bound shown next to the upload buttons.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 12 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub uploads: UploadPolicy,
}

/// Location of the backend and the auth collection used for users.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_backend_url")]
    pub url: String,
    #[serde(default = "default_collection")]
    pub collection: String,
}

fn default_backend_url() -> String {
    "http://127.0.0.1:8090".to_string()
}

fn default_collection() -> String {
    "users".to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            collection: default_collection(),
        }
    }
}

/// Limits for avatar and banner uploads.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UploadPolicy {
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
    /// When false the limits are only displayed, not checked before upload.
    #[serde(default = "default_enforce")]
    pub enforce: bool,
}

fn default_max_bytes() -> u64 {
    DEFAULT_MAX_UPLOAD_BYTES
}

fn default_allowed_extensions() -> Vec<String> {
    ["png", "jpg", "jpeg", "gif", "webp"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_enforce() -> bool {
    true
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_bytes: default_max_bytes(),
            allowed_extensions: default_allowed_extensions(),
            enforce: default_enforce(),
        }
    }
}

impl UploadPolicy {
    /// Human readable size limit, e.g. `"12MB"`.
    pub fn max_size_label(&self) -> String {
        let mb = self.max_bytes / (1024 * 1024);
        if mb > 0 && self.max_bytes % (1024 * 1024) == 0 {
            format!("{mb}MB")
        } else {
            format!("{}KB", self.max_bytes / 1024)
        }
    }

    /// Comma separated extension list for display.
    pub fn extensions_label(&self) -> String {
        self.allowed_extensions.join(", ")
    }

    /// Value for an `<input type="file" accept=...>` attribute.
    pub fn accept_attr(&self) -> String {
        self.allowed_extensions
            .iter()
            .map(|ext| format!(".{ext}"))
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl ClientConfig {
    /// The well-known filename for the config file.
    pub fn filename() -> &'static str {
        "icebyte.toml"
    }

    /// Builder method to point at another backend.
    pub fn with_backend_url(mut self, url: impl Into<String>) -> Self {
        self.backend.url = url.into();
        self
    }

    /// Parse from TOML string.
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Serialize to TOML string.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Read `icebyte.toml` from the working directory (if present) and apply
    /// the environment override.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let path = std::path::Path::new(Self::filename());
        let config = if path.exists() {
            Self::from_toml(&std::fs::read_to_string(path)?)?
        } else {
            Self::default()
        };

        Ok(match std::env::var(BACKEND_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => config.with_backend_url(url.trim()),
            _ => config,
        })
    }

    /// Browser builds have no filesystem; the URL can be baked in at compile time.
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Result<Self, ConfigError> {
        let config = Self::default();
        Ok(match option_env!("ICEBYTE_BACKEND_URL") {
            Some(url) if !url.trim().is_empty() => config.with_backend_url(url.trim()),
            _ => config,
        })
    }
}
