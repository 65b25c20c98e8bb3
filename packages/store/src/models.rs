//! # Domain models shared by the backend client and the UI
//!
//! These types mirror the records served by the backend's `users` auth
//! collection. They are `Serialize + Deserialize` so the same value can be
//! decoded from an HTTP response, persisted by an [`crate::AuthStore`] and
//! handed to the UI.
//!
//! | Type | Represents |
//! |------|-----------|
//! | [`UserRecord`] | A row of the `users` collection as the client sees it. |
//! | [`AuthCredentials`] | The token issued on login plus the record it belongs to. |
//! | [`ImageSlot`] | One of the two image fields (`avatar`, `banner`) of a user. |

use serde::{Deserialize, Serialize};

/// A user record from the `users` auth collection.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,
    #[serde(default)]
    pub collection_id: String,
    #[serde(default)]
    pub collection_name: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub verified: bool,
    /// Stored avatar file name; empty when no avatar is set.
    #[serde(default)]
    pub avatar: String,
    /// Stored banner file name; empty when no banner is set.
    #[serde(default)]
    pub banner: String,
}

impl UserRecord {
    /// First character of the display name, used where no avatar image exists.
    pub fn display_initial(&self) -> String {
        self.name
            .chars()
            .next()
            .or_else(|| self.username.chars().next())
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_else(|| "?".to_string())
    }

    /// File name stored in the given image slot, if any.
    pub fn image(&self, slot: ImageSlot) -> Option<&str> {
        let name = match slot {
            ImageSlot::Avatar => &self.avatar,
            ImageSlot::Banner => &self.banner,
        };
        (!name.is_empty()).then_some(name.as_str())
    }
}

/// Credentials persisted between app starts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuthCredentials {
    pub token: String,
    pub record: UserRecord,
}

/// The two image fields a user can upload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImageSlot {
    Avatar,
    Banner,
}

impl ImageSlot {
    /// Record field holding the file.
    pub fn field(self) -> &'static str {
        match self {
            ImageSlot::Avatar => "avatar",
            ImageSlot::Banner => "banner",
        }
    }

    /// Capitalised name for headings.
    pub fn label(self) -> &'static str {
        match self {
            ImageSlot::Avatar => "Avatar",
            ImageSlot::Banner => "Banner",
        }
    }
}
