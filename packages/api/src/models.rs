//! Request shapes sent to the backend.

use serde::{Deserialize, Serialize};

pub use store::models::{AuthCredentials, ImageSlot, UserRecord};

/// Fields collected by the register form.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

/// A partial user update. Only the fields that are `Some` are sent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl UserUpdate {
    pub fn username(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            ..Default::default()
        }
    }
}

/// A file picked by the user, read into memory.
#[derive(Clone, Debug, PartialEq)]
pub struct UploadFile {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: None,
            bytes,
        }
    }
}

/// Lowercased extension of a file name, if it has one.
pub fn file_extension(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    (!stem.is_empty() && !ext.is_empty()).then(|| ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_update_payload() {
        let body = serde_json::to_value(UserUpdate::username("ada")).unwrap();
        assert_eq!(body, serde_json::json!({ "username": "ada" }));
    }

    #[test]
    fn test_registration_uses_backend_field_names() {
        let body = serde_json::to_value(Registration {
            password_confirm: "pw".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(body["passwordConfirm"], "pw");
    }

    #[test]
    fn test_upload_extension() {
        assert_eq!(file_extension("Me.PNG").as_deref(), Some("png"));
        assert_eq!(file_extension("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(file_extension("README"), None);
        assert_eq!(file_extension(".hidden"), None);
    }
}
