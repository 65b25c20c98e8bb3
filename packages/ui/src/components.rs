//! Small form primitives shared by the gate and the profile editor.

use dioxus::prelude::*;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ButtonVariant {
    #[default]
    Primary,
    Secondary,
    Outline,
    Link,
    Destructive,
}

impl ButtonVariant {
    fn class(self) -> &'static str {
        match self {
            ButtonVariant::Primary => "btn btn-primary",
            ButtonVariant::Secondary => "btn btn-secondary",
            ButtonVariant::Outline => "btn btn-outline",
            ButtonVariant::Link => "btn-link",
            ButtonVariant::Destructive => "btn btn-destructive",
        }
    }
}

#[component]
pub fn Button(
    #[props(default)] variant: ButtonVariant,
    #[props(into, default)] class: String,
    onclick: EventHandler<MouseEvent>,
    children: Element,
) -> Element {
    let base = variant.class();

    rsx! {
        button {
            r#type: "button",
            class: "{base} {class}",
            onclick: move |evt| onclick.call(evt),
            {children}
        }
    }
}

#[component]
pub fn Input(
    #[props(into)] id: String,
    #[props(into, default)] class: String,
    #[props(into, default = "text".to_string())] input_type: String,
    #[props(into, default)] placeholder: String,
    #[props(into)] value: String,
    oninput: EventHandler<FormEvent>,
) -> Element {
    rsx! {
        input {
            id: "{id}",
            class: "input {class}",
            r#type: "{input_type}",
            placeholder: "{placeholder}",
            value: "{value}",
            oninput: move |evt| oninput.call(evt),
        }
    }
}
