//! # Auth store: where the login token lives between app starts
//!
//! The backend client never keeps credentials in a global. It owns a boxed
//! [`AuthStore`] and reads/writes through it:
//!
//! - after a successful login or registration it calls [`AuthStore::save`];
//! - at startup it calls [`AuthStore::load`] and, if something is there,
//!   asks the backend to refresh the token;
//! - on logout or when a refresh is rejected it calls [`AuthStore::clear`].
//!
//! The interface is synchronous because every backing medium (memory, a JSON
//! file, `localStorage`) is. Implementations live in sibling modules
//! ([`crate::memory`], [`crate::file_store`], and `local` on the web).

use crate::models::AuthCredentials;

/// Persistence for the current [`AuthCredentials`].
pub trait AuthStore {
    /// Credentials saved by a previous session, if any are readable.
    fn load(&self) -> Option<AuthCredentials>;

    /// Replace whatever is stored.
    fn save(&self, credentials: &AuthCredentials);

    /// Forget the stored credentials.
    fn clear(&self);
}

impl<T: AuthStore + ?Sized> AuthStore for Box<T> {
    fn load(&self) -> Option<AuthCredentials> {
        (**self).load()
    }

    fn save(&self, credentials: &AuthCredentials) {
        (**self).save(credentials)
    }

    fn clear(&self) {
        (**self).clear()
    }
}
