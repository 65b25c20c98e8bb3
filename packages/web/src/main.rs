use dioxus::prelude::*;

use ui::{AuthGate, AuthProvider, LogoutButton, ProfileEditor, ToastViewport};

#[derive(Debug, Clone, Routable, PartialEq)]
#[rustfmt::skip]
enum Route {
    #[route("/")]
    Home {},
    #[route("/profile")]
    Profile {},
}

const MAIN_CSS: Asset = asset!("/assets/main.css");

fn main() {
    dioxus::launch(App);
}

#[component]
fn App() -> Element {
    rsx! {
        // Global app resources
        document::Link { rel: "stylesheet", href: MAIN_CSS }
        document::Link { rel: "stylesheet", href: ui::UI_CSS }

        AuthProvider {
            Router::<Route> {}
            ToastViewport {}
        }
    }
}

/// Landing page for signed-in, verified users.
#[component]
fn Home() -> Element {
    let session = ui::use_session();
    let name = session
        .read()
        .user
        .as_ref()
        .map(|u| if u.name.is_empty() { u.username.clone() } else { u.name.clone() })
        .unwrap_or_default();

    rsx! {
        AuthGate {
            main {
                class: "home",
                h1 { "Welcome back, {name}" }
                nav {
                    class: "home-links",
                    Link { to: Route::Profile {}, "Edit profile" }
                    LogoutButton { class: "btn-link" }
                }
            }
        }
    }
}

#[component]
fn Profile() -> Element {
    rsx! {
        AuthGate {
            nav {
                class: "profile-nav",
                Link { to: Route::Home {}, "← Back" }
                LogoutButton { class: "btn-link" }
            }
            ProfileEditor {}
        }
    }
}
