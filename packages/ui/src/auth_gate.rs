//! The auth gate: shows its children only to verified users.
//!
//! Unauthenticated visitors get one of three forms ([`AuthMode`]). A user who
//! has logged in but not yet verified their email gets the
//! verification-pending screen. Everyone else sees the protected content.

use api::Registration;
use dioxus::prelude::*;

use crate::components::{Button, ButtonVariant, Input};
use crate::icons::FaEnvelope;
use crate::session::{use_auth, Session};
use crate::Icon;

/// Which form the gate shows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AuthMode {
    #[default]
    Login,
    Register,
    Reset,
}

impl AuthMode {
    pub fn title(self) -> &'static str {
        match self {
            AuthMode::Login => "Login to Icebyte",
            AuthMode::Register => "Join the club!",
            AuthMode::Reset => "Reset password",
        }
    }

    pub fn subtitle(self) -> &'static str {
        match self {
            AuthMode::Login => "Please log in with your icebyte account to continue.",
            AuthMode::Register => "Register a icebyte account and join the club!",
            AuthMode::Reset => "Please enter your email address to reset your password.",
        }
    }

    pub fn submit_label(self) -> &'static str {
        match self {
            AuthMode::Login => "Submit",
            AuthMode::Register => "Create Account",
            AuthMode::Reset => "Send",
        }
    }

    /// Mode shown after this mode's form was submitted. Register and reset
    /// fall back to login whether or not the call succeeds.
    pub fn after_submit(self) -> AuthMode {
        AuthMode::Login
    }
}

/// Drafts of every auth form field. Lives only while the form is mounted.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AuthForm {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

/// A submitted auth form, ready to hand to the session context.
#[derive(Clone, Debug, PartialEq)]
pub enum AuthRequest {
    LogIn { email: String, password: String },
    Register(Registration),
    ResetPassword { email: String },
}

impl AuthForm {
    /// The request `mode`'s submit button sends with the current drafts.
    pub fn request(&self, mode: AuthMode) -> AuthRequest {
        match mode {
            AuthMode::Login => AuthRequest::LogIn {
                email: self.email.clone(),
                password: self.password.clone(),
            },
            AuthMode::Register => AuthRequest::Register(Registration {
                name: self.name.clone(),
                username: self.username.clone(),
                email: self.email.clone(),
                password: self.password.clone(),
                password_confirm: self.password_confirm.clone(),
            }),
            AuthMode::Reset => AuthRequest::ResetPassword {
                email: self.email.clone(),
            },
        }
    }
}

/// Mode plus drafts: everything the sign-in screen tracks.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GateState {
    pub mode: AuthMode,
    pub form: AuthForm,
}

impl GateState {
    pub fn switch(&mut self, mode: AuthMode) {
        self.mode = mode;
    }

    /// Press the active mode's primary button.
    pub fn submit(&mut self) -> AuthRequest {
        let request = self.form.request(self.mode);
        self.mode = self.mode.after_submit();
        request
    }

    /// A document-level key press. Enter while unauthenticated submits.
    pub fn on_key(&mut self, key: &str, authenticated: bool) -> Option<AuthRequest> {
        (key == "Enter" && !authenticated).then(|| self.submit())
    }
}

/// What the gate renders for a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GateView {
    Loading,
    SignIn,
    VerificationPending { email: String },
    Protected,
}

impl GateView {
    pub fn of(session: &Session) -> Self {
        match &session.user {
            _ if session.loading => GateView::Loading,
            None => GateView::SignIn,
            Some(user) if !user.verified => GateView::VerificationPending {
                email: user.email.clone(),
            },
            Some(_) => GateView::Protected,
        }
    }
}

/// Render `children` only for a verified session.
#[component]
pub fn AuthGate(children: Element) -> Element {
    let session = use_auth().session();
    let view = GateView::of(&session.read());

    match view {
        GateView::Loading => rsx! {
            div { class: "gate-centered gate-muted", "Loading..." }
        },
        GateView::SignIn => rsx! {
            SignInForm {}
        },
        GateView::VerificationPending { email } => rsx! {
            VerificationPending { email }
        },
        GateView::Protected => rsx! {
            {children}
        },
    }
}

const ENTER_LISTENER_JS: &str = r#"(function() {
    if (window.__icebyteEnter) {
        document.removeEventListener('keydown', window.__icebyteEnter);
    }
    window.__icebyteEnter = function(e) {
        if (e.key === 'Enter') {
            e.preventDefault();
            dioxus.send(e.key);
        }
    };
    document.addEventListener('keydown', window.__icebyteEnter);
})();"#;

const REMOVE_ENTER_LISTENER_JS: &str = r#"(function() {
    if (window.__icebyteEnter) {
        document.removeEventListener('keydown', window.__icebyteEnter);
        window.__icebyteEnter = null;
    }
})();"#;

#[component]
fn SignInForm() -> Element {
    let auth = use_auth();
    let mut gate = use_signal(GateState::default);

    // Document-wide Enter submits the active form, for as long as it is shown.
    use_future(move || async move {
        let mut eval = document::eval(ENTER_LISTENER_JS);
        while let Ok(key) = eval.recv::<String>().await {
            let authenticated = auth.session().peek().is_authenticated();
            let request = gate.write().on_key(&key, authenticated);
            if let Some(request) = request {
                auth.dispatch(request);
            }
        }
    });
    use_drop(|| {
        document::eval(REMOVE_ENTER_LISTENER_JS);
    });

    let submit = move |_: MouseEvent| {
        let request = gate.write().submit();
        auth.dispatch(request);
    };

    let state = gate();
    let mode = state.mode;
    let form = state.form;
    let title = mode.title();
    let subtitle = mode.subtitle();
    let submit_label = mode.submit_label();

    rsx! {
        div {
            class: "gate-centered",
            div {
                class: "gate-card",
                div {
                    class: "gate-heading",
                    h1 { "{title}" }
                    p { class: "gate-muted", "{subtitle}" }
                }

                div {
                    class: "gate-fields",
                    if mode == AuthMode::Register {
                        Input {
                            id: "name",
                            placeholder: "Full Name",
                            value: form.name.clone(),
                            oninput: move |evt: FormEvent| gate.write().form.name = evt.value(),
                        }
                        Input {
                            id: "username",
                            placeholder: "Username",
                            value: form.username.clone(),
                            oninput: move |evt: FormEvent| gate.write().form.username = evt.value(),
                        }
                    }

                    Input {
                        id: "email",
                        input_type: "email",
                        placeholder: "Email",
                        value: form.email.clone(),
                        oninput: move |evt: FormEvent| gate.write().form.email = evt.value(),
                    }

                    if mode != AuthMode::Reset {
                        Input {
                            id: "password",
                            input_type: "password",
                            placeholder: "Password",
                            value: form.password.clone(),
                            oninput: move |evt: FormEvent| gate.write().form.password = evt.value(),
                        }
                    }

                    if mode == AuthMode::Register {
                        Input {
                            id: "passwordConfirm",
                            input_type: "password",
                            placeholder: "Password Confirmation",
                            value: form.password_confirm.clone(),
                            oninput: move |evt: FormEvent| gate.write().form.password_confirm = evt.value(),
                        }
                    }

                    Button {
                        class: "w-full",
                        onclick: submit,
                        "{submit_label}"
                    }

                    if mode != AuthMode::Reset {
                        small {
                            class: "gate-muted gate-legal",
                            "By continuing, you agree to our "
                            a { href: "/tos", "Terms of Service" }
                            " and "
                            a { href: "/privacy", "Privacy Policy" }
                            "."
                        }
                    }
                }

                hr { class: "gate-rule" }

                div {
                    class: "gate-links",
                    match mode {
                        AuthMode::Login => rsx! {
                            span {
                                "Forgot password? "
                                Button {
                                    variant: ButtonVariant::Link,
                                    onclick: move |_| gate.write().switch(AuthMode::Reset),
                                    "Reset"
                                }
                            }
                            span {
                                "Don't have an account? "
                                Button {
                                    variant: ButtonVariant::Link,
                                    onclick: move |_| gate.write().switch(AuthMode::Register),
                                    "Sign up"
                                }
                            }
                        },
                        AuthMode::Register => rsx! {
                            span {
                                "Already have an account? "
                                Button {
                                    variant: ButtonVariant::Link,
                                    onclick: move |_| gate.write().switch(AuthMode::Login),
                                    "Login"
                                }
                            }
                        },
                        AuthMode::Reset => rsx! {
                            span {
                                "Remember your password? "
                                Button {
                                    variant: ButtonVariant::Link,
                                    onclick: move |_| gate.write().switch(AuthMode::Login),
                                    "Login"
                                }
                            }
                        },
                    }
                }
            }
        }
    }
}

#[component]
fn VerificationPending(email: String) -> Element {
    let auth = use_auth();

    rsx! {
        div {
            class: "gate-centered",
            div {
                class: "gate-card",
                div {
                    class: "gate-heading",
                    h1 { "Verification required" }
                    p { class: "gate-muted", "To continue, please check your email for a verification link." }
                }
                Button {
                    onclick: move |_| auth.request_verification(email.clone()),
                    Icon { icon: FaEnvelope, width: 14, height: 14 }
                    span { "Resend verification email" }
                }
                Button {
                    variant: ButtonVariant::Link,
                    onclick: move |_| auth.log_out(),
                    "Use another account"
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use api::UserRecord;

    fn filled() -> GateState {
        GateState {
            mode: AuthMode::Login,
            form: AuthForm {
                name: "Ada Lovelace".to_string(),
                username: "ada".to_string(),
                email: "a@b.com".to_string(),
                password: "x".to_string(),
                password_confirm: "x".to_string(),
            },
        }
    }

    fn session_with(verified: bool) -> Session {
        Session {
            user: Some(UserRecord {
                id: "u1".to_string(),
                email: "a@b.com".to_string(),
                verified,
                ..Default::default()
            }),
            avatar_url: None,
            banner_url: None,
            loading: false,
        }
    }

    #[test]
    fn test_login_submit_sends_fields() {
        let mut gate = filled();
        assert_eq!(
            gate.submit(),
            AuthRequest::LogIn {
                email: "a@b.com".to_string(),
                password: "x".to_string()
            }
        );
        assert_eq!(gate.mode, AuthMode::Login);
    }

    #[test]
    fn test_register_and_reset_return_to_login() {
        let mut gate = filled();
        gate.switch(AuthMode::Register);
        let AuthRequest::Register(registration) = gate.submit() else {
            panic!("expected a registration");
        };
        assert_eq!(registration.username, "ada");
        assert_eq!(registration.password_confirm, "x");
        assert_eq!(gate.mode, AuthMode::Login);

        gate.switch(AuthMode::Reset);
        assert_eq!(
            gate.submit(),
            AuthRequest::ResetPassword {
                email: "a@b.com".to_string()
            }
        );
        assert_eq!(gate.mode, AuthMode::Login);
    }

    #[test]
    fn test_enter_matches_button_in_every_mode() {
        for mode in [AuthMode::Login, AuthMode::Register, AuthMode::Reset] {
            let mut by_key = filled();
            by_key.switch(mode);
            let mut by_click = by_key.clone();

            let pressed = by_key.on_key("Enter", false);
            let clicked = by_click.submit();

            assert_eq!(pressed, Some(clicked));
            assert_eq!(by_key, by_click);
        }
    }

    #[test]
    fn test_enter_ignored_when_authenticated_or_other_key() {
        let mut gate = filled();
        gate.switch(AuthMode::Register);

        assert_eq!(gate.on_key("Enter", true), None);
        assert_eq!(gate.on_key("a", false), None);
        assert_eq!(gate.on_key("Escape", false), None);
        // Nothing was submitted, so the mode is untouched
        assert_eq!(gate.mode, AuthMode::Register);
    }

    #[test]
    fn test_gate_view() {
        assert_eq!(GateView::of(&Session::default()), GateView::Loading);
        assert_eq!(GateView::of(&Session::signed_out()), GateView::SignIn);
        assert_eq!(
            GateView::of(&session_with(false)),
            GateView::VerificationPending {
                email: "a@b.com".to_string()
            }
        );
        assert_eq!(GateView::of(&session_with(true)), GateView::Protected);
    }

    #[test]
    fn test_mode_copy() {
        assert_eq!(AuthMode::default(), AuthMode::Login);
        assert_eq!(AuthMode::Login.submit_label(), "Submit");
        assert_eq!(AuthMode::Register.submit_label(), "Create Account");
        assert_eq!(AuthMode::Reset.title(), "Reset password");
    }
}
