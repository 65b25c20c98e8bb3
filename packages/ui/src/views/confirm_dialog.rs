use dioxus::prelude::*;

use crate::components::{Button, ButtonVariant};

/// A full-screen overlay asking the user to confirm a destructive action.
/// Clicking outside the card cancels.
#[component]
pub fn ConfirmDialog(
    #[props(into)] title: String,
    #[props(into)] description: String,
    #[props(into, default = "Confirm".to_string())] confirm_label: String,
    on_cancel: EventHandler<()>,
    on_confirm: EventHandler<()>,
) -> Element {
    rsx! {
        div {
            class: "dialog-overlay",
            role: "alertdialog",
            onclick: move |_| on_cancel.call(()),
            div {
                class: "dialog-card",
                onclick: move |evt: Event<MouseData>| evt.stop_propagation(),
                h2 { class: "dialog-title", "{title}" }
                p { class: "gate-muted", "{description}" }
                div {
                    class: "dialog-actions",
                    Button {
                        variant: ButtonVariant::Outline,
                        onclick: move |_| on_cancel.call(()),
                        "Cancel"
                    }
                    Button {
                        variant: ButtonVariant::Destructive,
                        onclick: move |_| on_confirm.call(()),
                        "{confirm_label}"
                    }
                }
            }
        }
    }
}
