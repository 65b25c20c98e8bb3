//! Profile editor: username, avatar and banner.
//!
//! Each control is independent. Saving the username validates the draft
//! locally and sends a single partial update; uploads and removals go straight
//! to the backend. Nothing is serialised or de-duplicated, so overlapping
//! clicks produce overlapping requests.

use api::{file_extension, ImageSlot, UploadFile, UserUpdate};
use dioxus::html::FileData;
use dioxus::prelude::*;
use store::UploadPolicy;
use thiserror::Error;

use crate::components::{Button, ButtonVariant, Input};
use crate::icons::{FaTrashCan, FaUpload};
use crate::session::use_auth;
use crate::toast::{self, ToastKind};
use crate::views::ConfirmDialog;
use crate::Icon;

pub const USERNAME_MIN_CHARS: usize = 2;
pub const USERNAME_MAX_CHARS: usize = 12;

/// Why a username draft was not sent.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("No changes were made.")]
    NoChanges,
    #[error("Invalid username.")]
    InvalidUsername,
}

impl ProfileError {
    pub fn description(&self) -> &'static str {
        match self {
            ProfileError::NoChanges => "Please make some changes before saving.",
            ProfileError::InvalidUsername => {
                "Your username must be between 2 and 12 characters long."
            }
        }
    }
}

/// Check a username draft against the current value.
///
/// Length is counted in characters, not bytes.
pub fn validate_username(current: &str, draft: &str) -> Result<UserUpdate, ProfileError> {
    if draft == current {
        return Err(ProfileError::NoChanges);
    }
    let len = draft.chars().count();
    if !(USERNAME_MIN_CHARS..=USERNAME_MAX_CHARS).contains(&len) {
        return Err(ProfileError::InvalidUsername);
    }
    Ok(UserUpdate::username(draft))
}

/// Two-step confirmation for destructive actions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RemovalConfirm {
    #[default]
    Idle,
    Armed,
}

impl RemovalConfirm {
    /// First click: open the confirmation.
    pub fn arm(&mut self) {
        *self = RemovalConfirm::Armed;
    }

    pub fn cancel(&mut self) {
        *self = RemovalConfirm::Idle;
    }

    /// Second click. Returns whether the action should run.
    pub fn confirm(&mut self) -> bool {
        let armed = self.is_armed();
        *self = RemovalConfirm::Idle;
        armed
    }

    pub fn is_armed(self) -> bool {
        self == RemovalConfirm::Armed
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum UploadRejection {
    #[error("Unsupported file type.")]
    UnsupportedType { allowed: String },
    #[error("File too large.")]
    TooLarge { max: String },
}

impl UploadRejection {
    pub fn description(&self) -> String {
        match self {
            UploadRejection::UnsupportedType { allowed } => {
                format!("Supported file types include: {allowed}")
            }
            UploadRejection::TooLarge { max } => format!("Max file size: {max}"),
        }
    }
}

/// Apply the upload limits to a picked file's name and reported size, unless
/// the policy only displays them.
pub fn check_upload(policy: &UploadPolicy, name: &str, size: u64) -> Result<(), UploadRejection> {
    if !policy.enforce {
        return Ok(());
    }
    let allowed = file_extension(name)
        .is_some_and(|ext| policy.allowed_extensions.iter().any(|a| a.eq_ignore_ascii_case(&ext)));
    if !allowed {
        return Err(UploadRejection::UnsupportedType {
            allowed: policy.extensions_label(),
        });
    }
    if size > policy.max_bytes {
        return Err(UploadRejection::TooLarge {
            max: policy.max_size_label(),
        });
    }
    Ok(())
}

/// Check a picked file and load it. Rejected files are never read.
async fn read_selection(
    policy: &UploadPolicy,
    file: &FileData,
) -> Result<Option<UploadFile>, UploadRejection> {
    let name = file.name();
    check_upload(policy, &name, file.size())?;
    match file.read_bytes().await {
        Ok(bytes) => Ok(Some(UploadFile {
            name,
            content_type: file.content_type(),
            bytes: bytes.to_vec(),
        })),
        Err(e) => {
            tracing::warn!("Could not read selected file {}: {}", name, e);
            Ok(None)
        }
    }
}

/// The profile page body. Must be rendered inside an [`crate::AuthGate`].
#[component]
pub fn ProfileEditor() -> Element {
    let auth = use_auth();
    let session = auth.session();
    let current = session.read().user.clone();
    let initial = current.as_ref().map(|u| u.username.clone()).unwrap_or_default();
    let mut username = use_signal(move || initial);

    let Some(user) = current else {
        return rsx! {};
    };

    rsx! {
        div {
            class: "profile-page",
            div {
                class: "profile-header",
                h1 { "Profile" }
                p { class: "gate-muted", "Manage your style and how you look to others on Icebyte!" }
            }

            div {
                class: "profile-sections",

                section {
                    class: "profile-section",
                    div {
                        h2 { "Username" }
                        p { class: "gate-muted", "If your profile is public, your username is publicly visible in comments and likes." }
                    }
                    Input {
                        id: "profile-username",
                        placeholder: user.username.clone(),
                        value: username(),
                        oninput: move |evt: FormEvent| username.set(evt.value()),
                    }
                    div {
                        class: "profile-row",
                        p {
                            class: "gate-muted",
                            "Your username "
                            b { "must" }
                            " be between 2 and 12 characters long."
                        }
                        Button {
                            onclick: move |_| auth.save_username(username()),
                            "Save"
                        }
                    }
                }

                ImageSection { slot: ImageSlot::Avatar }
                ImageSection { slot: ImageSlot::Banner }
            }
        }
    }
}

#[component]
fn ImageSection(slot: ImageSlot) -> Element {
    let auth = use_auth();
    let session = auth.session();
    let mut confirm = use_signal(RemovalConfirm::default);

    let snapshot = session.read().clone();
    let image_url = snapshot.image_url(slot).map(str::to_string);
    let initial = snapshot
        .user
        .as_ref()
        .map(|u| u.display_initial())
        .unwrap_or_default();
    let policy = auth.service().uploads().clone();
    let accept = policy.accept_attr();
    let extensions = policy.extensions_label();
    let max_size = policy.max_size_label();

    let field = slot.field();
    let label = slot.label();
    let input_id = format!("{field}-input");

    let open_picker = {
        let input_id = input_id.clone();
        move |_: MouseEvent| {
            document::eval(&format!("document.getElementById('{input_id}').click()"));
        }
    };

    let on_file = move |evt: FormEvent| {
        let policy = policy.clone();
        spawn(async move {
            let Some(picked) = evt.files().into_iter().next() else {
                return;
            };
            match read_selection(&policy, &picked).await {
                Ok(Some(file)) => auth.upload_image(slot, file),
                Ok(None) => {}
                Err(rejection) => {
                    toast::notify(
                        auth.toaster(),
                        ToastKind::Error,
                        rejection.to_string(),
                        Some(rejection.description()),
                    );
                }
            }
        });
    };

    rsx! {
        section {
            class: "profile-section",
            div {
                h2 { "{label}" }
                p { class: "gate-muted", "Your {field} will be publicly visible in comments and likes but not referenced to your user." }
            }
            div {
                class: if slot == ImageSlot::Banner { "profile-image-row profile-image-row--banner" } else { "profile-image-row" },
                match slot {
                    ImageSlot::Avatar => rsx! {
                        div {
                            class: "profile-avatar",
                            if let Some(url) = image_url.clone() {
                                img { src: "{url}", alt: "avatar" }
                            } else {
                                span { "{initial}" }
                            }
                        }
                    },
                    ImageSlot::Banner => rsx! {
                        div {
                            class: "profile-banner",
                            if let Some(url) = image_url.clone() {
                                img { src: "{url}", alt: "banner" }
                            }
                        }
                    },
                }
                input {
                    id: "{input_id}",
                    class: "hidden",
                    r#type: "file",
                    accept: "{accept}",
                    onchange: on_file,
                }
                div {
                    class: "profile-image-actions",
                    Button {
                        onclick: open_picker,
                        Icon { icon: FaUpload, width: 12, height: 12 }
                        span { "Upload" }
                    }
                    Button {
                        variant: ButtonVariant::Secondary,
                        onclick: move |_| confirm.write().arm(),
                        Icon { icon: FaTrashCan, width: 12, height: 12 }
                        span { "Remove" }
                    }
                }
            }
            p {
                class: "gate-muted",
                "Support file types include: "
                b { "{extensions}" }
                br {}
                "Max file size: "
                b { "{max_size}" }
            }

            if confirm().is_armed() {
                ConfirmDialog {
                    title: "Are you absolutely sure?",
                    description: format!("This action cannot be undone. This will permanently delete your {field} from our servers."),
                    on_cancel: move |_| confirm.write().cancel(),
                    on_confirm: move |_| {
                        if confirm.write().confirm() {
                            auth.remove_image(slot);
                        }
                    },
                }
            }
        }
    }
}
