//! Toast notifications.
//!
//! Every remote call made from the UI ends in exactly one toast. Calls that
//! show progress start as a [`ToastKind::Loading`] toast and are resolved in
//! place to success or error, so the user sees one notification per attempt.

use std::future::Future;

use dioxus::prelude::*;

/// How long settled toasts stay on screen.
pub const TOAST_DURATION: std::time::Duration = std::time::Duration::from_secs(4);

pub type ToastId = u64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastKind {
    Loading,
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Toast {
    pub id: ToastId,
    pub kind: ToastKind,
    pub title: String,
    pub description: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Toaster {
    next_id: ToastId,
    toasts: Vec<Toast>,
}

impl Toaster {
    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    pub fn get(&self, id: ToastId) -> Option<&Toast> {
        self.toasts.iter().find(|t| t.id == id)
    }

    pub fn push(
        &mut self,
        kind: ToastKind,
        title: impl Into<String>,
        description: Option<String>,
    ) -> ToastId {
        self.next_id += 1;
        self.toasts.push(Toast {
            id: self.next_id,
            kind,
            title: title.into(),
            description,
        });
        self.next_id
    }

    pub fn loading(&mut self, title: impl Into<String>) -> ToastId {
        self.push(ToastKind::Loading, title, None)
    }

    pub fn success(&mut self, title: impl Into<String>, description: Option<String>) -> ToastId {
        self.push(ToastKind::Success, title, description)
    }

    pub fn error(&mut self, title: impl Into<String>, description: Option<String>) -> ToastId {
        self.push(ToastKind::Error, title, description)
    }

    /// Settle a loading toast. Pushes a new toast if `id` was already dismissed.
    pub fn resolve(
        &mut self,
        id: ToastId,
        kind: ToastKind,
        title: impl Into<String>,
        description: Option<String>,
    ) -> ToastId {
        match self.toasts.iter_mut().find(|t| t.id == id) {
            Some(toast) => {
                toast.kind = kind;
                toast.title = title.into();
                toast.description = description;
                id
            }
            None => self.push(kind, title, description),
        }
    }

    pub fn dismiss(&mut self, id: ToastId) {
        self.toasts.retain(|t| t.id != id);
    }
}

/// Messages for the three states of a tracked operation.
#[derive(Clone, Copy, Debug)]
pub struct ToastMessages {
    pub loading: &'static str,
    pub success: &'static str,
    pub error: &'static str,
}

/// Show `loading` while `fut` runs, then resolve to `success` or `error`.
pub async fn track<T, E>(
    mut toaster: Signal<Toaster>,
    messages: ToastMessages,
    fut: impl Future<Output = Result<T, E>>,
) -> Result<T, E> {
    let id = toaster.write().loading(messages.loading);
    let result = fut.await;
    let kind = if result.is_ok() {
        ToastKind::Success
    } else {
        ToastKind::Error
    };
    let title = if result.is_ok() {
        messages.success
    } else {
        messages.error
    };
    let id = toaster.write().resolve(id, kind, title, None);
    dismiss_later(toaster, id);
    result
}

/// Push a settled toast and schedule its removal.
pub fn notify(
    mut toaster: Signal<Toaster>,
    kind: ToastKind,
    title: impl Into<String>,
    description: Option<String>,
) -> ToastId {
    let id = toaster.write().push(kind, title, description);
    if kind != ToastKind::Loading {
        dismiss_later(toaster, id);
    }
    id
}

/// Settle a loading toast and schedule its removal.
pub fn settle(
    mut toaster: Signal<Toaster>,
    id: ToastId,
    kind: ToastKind,
    title: impl Into<String>,
    description: Option<String>,
) {
    let id = toaster.write().resolve(id, kind, title, description);
    dismiss_later(toaster, id);
}

fn dismiss_later(mut toaster: Signal<Toaster>, id: ToastId) {
    spawn(async move {
        sleep(TOAST_DURATION).await;
        toaster.write().dismiss(id);
    });
}

pub(crate) async fn sleep(duration: std::time::Duration) {
    #[cfg(target_arch = "wasm32")]
    gloo_timers::future::sleep(duration).await;
    #[cfg(not(target_arch = "wasm32"))]
    tokio::time::sleep(duration).await;
}
