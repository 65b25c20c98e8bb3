//! The contract the UI expects from the remote backend.

use async_trait::async_trait;

use crate::error::BackendError;
use crate::models::{ImageSlot, Registration, UploadFile, UserRecord, UserUpdate};

pub type Result<T> = std::result::Result<T, BackendError>;

/// Authentication, record updates and file storage for the `users` collection.
///
/// Futures are not `Send`: the UI runs on a single thread and the browser HTTP
/// client is not thread safe.
#[async_trait(?Send)]
pub trait Backend {
    /// Authenticate with email and password and persist the issued session.
    async fn log_in(&self, email: &str, password: &str) -> Result<UserRecord>;

    /// Create an account, ask the backend to send the verification email and
    /// log the new user in.
    async fn register(&self, registration: &Registration) -> Result<UserRecord>;

    /// Ask the backend to email a password reset link.
    async fn reset_password(&self, email: &str) -> Result<()>;

    /// Ask the backend to (re)send the verification email.
    async fn request_verification(&self, email: &str) -> Result<()>;

    /// Apply a partial update to a user record.
    async fn update(&self, user_id: &str, update: &UserUpdate) -> Result<UserRecord>;

    /// Replace the file stored in `slot`.
    async fn upload_image(
        &self,
        user_id: &str,
        slot: ImageSlot,
        file: UploadFile,
    ) -> Result<UserRecord>;

    /// Delete the file stored in `slot`.
    async fn remove_image(&self, user_id: &str, slot: ImageSlot) -> Result<UserRecord>;

    /// Refresh persisted credentials. `Ok(None)` when there is nothing to restore.
    async fn restore(&self) -> Result<Option<UserRecord>>;

    /// Re-read the current user's record.
    async fn fetch_user(&self, user_id: &str) -> Result<UserRecord>;

    /// Forget the persisted credentials.
    fn log_out(&self);

    /// Public URL of a file stored on `record`; `None` for an empty name.
    fn file_url(&self, record: &UserRecord, filename: &str) -> Option<String>;

    async fn upload_avatar(&self, user_id: &str, file: UploadFile) -> Result<UserRecord> {
        self.upload_image(user_id, ImageSlot::Avatar, file).await
    }

    async fn remove_avatar(&self, user_id: &str) -> Result<UserRecord> {
        self.remove_image(user_id, ImageSlot::Avatar).await
    }

    async fn upload_banner(&self, user_id: &str, file: UploadFile) -> Result<UserRecord> {
        self.upload_image(user_id, ImageSlot::Banner, file).await
    }

    async fn remove_banner(&self, user_id: &str) -> Result<UserRecord> {
        self.remove_image(user_id, ImageSlot::Banner).await
    }
}
