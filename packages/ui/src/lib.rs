//! This crate contains all shared UI for the workspace.
//!
//! | Module | Contents |
//! |---|---|
//! | [`session`] | `AuthProvider`, `AuthContext`, `use_auth`, `LogoutButton` |
//! | [`auth_gate`] | `AuthGate` and its sign-in / verification screens |
//! | [`profile`] | `ProfileEditor`, username validation, upload checks |
//! | [`toast`] | Notification state and helpers |
//! | [`views`] | `ConfirmDialog`, `ToastViewport` |

use dioxus::prelude::*;

pub mod components;

// Re-export icon library
pub use dioxus_free_icons::Icon;
pub mod icons {
    pub use dioxus_free_icons::icons::fa_solid_icons::*;
}

mod backend;
pub use backend::{make_backend, make_service, MEMORY_BACKEND_URL};

pub mod views;
pub use views::{ConfirmDialog, ToastViewport};

pub const UI_CSS: Asset = asset!("/assets/ui.css");

pub mod toast;
pub use toast::{ToastKind, Toaster};

pub mod session;
pub use session::{
    use_auth, use_session, AuthContext, AuthProvider, AuthService, LogoutButton, Session,
};

pub mod auth_gate;
pub use auth_gate::{AuthGate, AuthMode};

pub mod profile;
pub use profile::ProfileEditor;

#[cfg(test)]
mod test_support;
