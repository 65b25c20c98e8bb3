use dioxus::prelude::*;

use crate::session::use_auth;
use crate::toast::ToastKind;

/// Renders the toast stack, newest at the bottom. Place once near the root,
/// inside the `AuthProvider`.
#[component]
pub fn ToastViewport() -> Element {
    let auth = use_auth();
    let mut toaster = auth.toaster();
    let toasts = toaster.read().toasts().to_vec();

    if toasts.is_empty() {
        return rsx! {};
    }

    rsx! {
        ol {
            class: "toast-viewport",
            for toast in toasts {
                li {
                    key: "{toast.id}",
                    class: match toast.kind {
                        ToastKind::Loading => "toast loading",
                        ToastKind::Success => "toast success",
                        ToastKind::Error => "toast error",
                    },
                    div {
                        class: "toast-body",
                        span { class: "toast-title", "{toast.title}" }
                        if let Some(description) = toast.description.clone() {
                            pre { class: "toast-description", "{description}" }
                        }
                    }
                    if toast.kind != ToastKind::Loading {
                        button {
                            class: "toast-close",
                            title: "Dismiss",
                            onclick: move |_| toaster.write().dismiss(toast.id),
                            "×"
                        }
                    }
                }
            }
        }
    }
}
