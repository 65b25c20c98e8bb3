//! # API crate: the remote backend client
//!
//! The UI never talks HTTP itself. It holds an `Rc<dyn Backend>` and calls the
//! operations of the [`Backend`] trait; which implementation sits behind it is
//! decided once, at app start.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`backend`] | The [`Backend`] trait: login, registration, password reset, verification, record updates, image upload/removal, session restore |
//! | [`pocketbase`] | [`PocketBaseClient`], the HTTP implementation for a PocketBase `users` auth collection |
//! | [`memory`] | [`MemoryBackend`], an in-process implementation for tests and offline use |
//! | [`models`] | Request shapes ([`Registration`], [`UserUpdate`], [`UploadFile`]) and the re-exported record types |
//! | [`error`] | [`BackendError`], which keeps the provider's error payload verbatim |

pub mod backend;
pub mod error;
pub mod memory;
pub mod models;
pub mod pocketbase;

pub use backend::Backend;
pub use error::BackendError;
pub use memory::MemoryBackend;
pub use models::{
    file_extension, AuthCredentials, ImageSlot, Registration, UploadFile, UserRecord, UserUpdate,
};
pub use pocketbase::PocketBaseClient;
