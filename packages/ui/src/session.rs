//! Session state and the auth context provided to the component tree.
//!
//! [`AuthService`] does the work: one backend round trip per method, returning
//! the next [`Session`]. It has no UI dependencies so it can be tested on its
//! own. [`AuthContext`] wraps it for components: it owns the session and toast
//! signals, spawns each call so input is never blocked, and reports failures
//! as toasts. Components only read the session; they change it exclusively
//! through [`AuthContext`] methods.

use std::rc::Rc;

use api::{Backend, BackendError, ImageSlot, Registration, UploadFile, UserRecord, UserUpdate};
use dioxus::prelude::*;
use store::UploadPolicy;

use crate::auth_gate::AuthRequest;
use crate::profile::validate_username;
use crate::toast::{self, ToastKind, ToastMessages, Toaster};

/// How often an unverified user's record is re-read.
const VERIFICATION_POLL: std::time::Duration = std::time::Duration::from_secs(30);

/// The client's view of who is logged in.
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    pub user: Option<UserRecord>,
    pub avatar_url: Option<String>,
    pub banner_url: Option<String>,
    /// True until the persisted session has been restored or discarded.
    pub loading: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            user: None,
            avatar_url: None,
            banner_url: None,
            loading: true,
        }
    }
}

impl Session {
    pub fn signed_out() -> Self {
        Self {
            loading: false,
            ..Self::default()
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn image_url(&self, slot: ImageSlot) -> Option<&str> {
        match slot {
            ImageSlot::Avatar => self.avatar_url.as_deref(),
            ImageSlot::Banner => self.banner_url.as_deref(),
        }
    }
}

/// Backend calls that produce the next [`Session`].
#[derive(Clone)]
pub struct AuthService {
    backend: Rc<dyn Backend>,
    uploads: UploadPolicy,
}

impl PartialEq for AuthService {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.backend, &other.backend) && self.uploads == other.uploads
    }
}

impl AuthService {
    pub fn new(backend: Rc<dyn Backend>, uploads: UploadPolicy) -> Self {
        Self { backend, uploads }
    }

    pub fn uploads(&self) -> &UploadPolicy {
        &self.uploads
    }

    /// Build a session for `user`, resolving image file names to URLs.
    pub fn session_for(&self, user: UserRecord) -> Session {
        let avatar_url = user
            .image(ImageSlot::Avatar)
            .and_then(|name| self.backend.file_url(&user, name));
        let banner_url = user
            .image(ImageSlot::Banner)
            .and_then(|name| self.backend.file_url(&user, name));
        Session {
            user: Some(user),
            avatar_url,
            banner_url,
            loading: false,
        }
    }

    /// Restore persisted credentials. Any failure leaves the user logged out.
    pub async fn restore(&self) -> Session {
        match self.backend.restore().await {
            Ok(Some(user)) => {
                tracing::info!("Restored session for {}", user.id);
                self.session_for(user)
            }
            Ok(None) => Session::signed_out(),
            Err(e) => {
                tracing::warn!("Discarding persisted session: {}", e);
                Session::signed_out()
            }
        }
    }

    pub async fn log_in(&self, email: &str, password: &str) -> Result<Session, BackendError> {
        let user = self.backend.log_in(email, password).await?;
        Ok(self.session_for(user))
    }

    pub async fn register(&self, registration: &Registration) -> Result<Session, BackendError> {
        let user = self.backend.register(registration).await?;
        Ok(self.session_for(user))
    }

    pub async fn reset_password(&self, email: &str) -> Result<(), BackendError> {
        self.backend.reset_password(email).await
    }

    pub async fn request_verification(&self, email: &str) -> Result<(), BackendError> {
        self.backend.request_verification(email).await
    }

    pub async fn update_user(
        &self,
        user_id: &str,
        update: &UserUpdate,
    ) -> Result<Session, BackendError> {
        let user = self.backend.update(user_id, update).await?;
        Ok(self.session_for(user))
    }

    pub async fn upload_image(
        &self,
        user_id: &str,
        slot: ImageSlot,
        file: UploadFile,
    ) -> Result<Session, BackendError> {
        let user = match slot {
            ImageSlot::Avatar => self.backend.upload_avatar(user_id, file).await?,
            ImageSlot::Banner => self.backend.upload_banner(user_id, file).await?,
        };
        Ok(self.session_for(user))
    }

    pub async fn remove_image(
        &self,
        user_id: &str,
        slot: ImageSlot,
    ) -> Result<Session, BackendError> {
        let user = match slot {
            ImageSlot::Avatar => self.backend.remove_avatar(user_id).await?,
            ImageSlot::Banner => self.backend.remove_banner(user_id).await?,
        };
        Ok(self.session_for(user))
    }

    pub async fn refresh(&self, user_id: &str) -> Result<Session, BackendError> {
        let user = self.backend.fetch_user(user_id).await?;
        Ok(self.session_for(user))
    }

    pub fn log_out(&self) -> Session {
        self.backend.log_out();
        Session::signed_out()
    }
}

/// The session context shared with every component below [`AuthProvider`].
#[derive(Clone, Copy, PartialEq)]
pub struct AuthContext {
    session: Signal<Session>,
    toaster: Signal<Toaster>,
    service: Signal<AuthService>,
    /// Bumped on every logout. Completions started under an older value are dropped.
    logouts: Signal<u64>,
}

impl AuthContext {
    pub fn session(&self) -> Signal<Session> {
        self.session
    }

    pub fn toaster(&self) -> Signal<Toaster> {
        self.toaster
    }

    pub fn service(&self) -> AuthService {
        AuthService::clone(&self.service.read())
    }

    fn set_session(&self, next: Session) {
        let mut session = self.session;
        session.set(next);
    }

    fn current_user(&self) -> Option<UserRecord> {
        self.session.peek().user.clone()
    }

    fn logout_count(&self) -> u64 {
        *self.logouts.peek()
    }

    /// Apply a completed call's session unless a logout happened since it was
    /// issued, or the session now belongs to someone other than `user_id`.
    fn apply(&self, issued_at: u64, user_id: Option<&str>, next: Session) {
        let same_user = match user_id {
            Some(id) => self.current_user().is_some_and(|u| u.id == id),
            None => true,
        };
        if self.logout_count() != issued_at || !same_user {
            tracing::debug!("Dropping a response that finished after the session changed");
            return;
        }
        self.set_session(next);
    }

    fn fail(&self, title: &str, err: &BackendError) {
        tracing::warn!("{} {}", title, err);
        toast::notify(self.toaster, ToastKind::Error, title, Some(err.payload_json()));
    }

    /// Run the submit action of an auth form.
    pub fn dispatch(&self, request: AuthRequest) {
        match request {
            AuthRequest::LogIn { email, password } => self.log_in(email, password),
            AuthRequest::Register(registration) => self.register(registration),
            AuthRequest::ResetPassword { email } => self.reset_password(email),
        }
    }

    pub fn log_in(&self, email: String, password: String) {
        let ctx = *self;
        let issued_at = self.logout_count();
        spawn(async move {
            match ctx.service().log_in(&email, &password).await {
                Ok(session) => ctx.apply(issued_at, None, session),
                Err(e) => ctx.fail("Failed to log in.", &e),
            }
        });
    }

    pub fn register(&self, registration: Registration) {
        let ctx = *self;
        let issued_at = self.logout_count();
        spawn(async move {
            match ctx.service().register(&registration).await {
                Ok(session) => {
                    ctx.apply(issued_at, None, session);
                    toast::notify(
                        ctx.toaster,
                        ToastKind::Success,
                        "Account created.",
                        Some("Check your inbox for a verification link.".to_string()),
                    );
                }
                Err(e) => ctx.fail("Failed to create account.", &e),
            }
        });
    }

    pub fn reset_password(&self, email: String) {
        let ctx = *self;
        spawn(async move {
            match ctx.service().reset_password(&email).await {
                Ok(()) => {
                    toast::notify(
                        ctx.toaster,
                        ToastKind::Success,
                        "Password reset requested.",
                        Some("If the address has an account, a reset link is on its way.".to_string()),
                    );
                }
                Err(e) => ctx.fail("Failed to request a password reset.", &e),
            }
        });
    }

    /// Resend the verification email for the current user.
    pub fn request_verification(&self, email: String) {
        let ctx = *self;
        spawn(async move {
            let service = ctx.service();
            let result = toast::track(
                ctx.toaster,
                ToastMessages {
                    loading: "Sending verification email...",
                    success: "Verification email sent!",
                    error: "Failed to send verification email.",
                },
                service.request_verification(&email),
            )
            .await;
            if let Err(e) = result {
                tracing::warn!("Verification email request failed: {}", e);
            }
        });
    }

    /// Send a partial update for the current user and report the result.
    pub fn update_user(&self, update: UserUpdate, message: &'static str) {
        let Some(user) = self.current_user() else {
            return;
        };
        let ctx = *self;
        let issued_at = self.logout_count();
        spawn(async move {
            let mut toaster = ctx.toaster;
            let id = toaster.write().loading("Saving changes...");
            match ctx.service().update_user(&user.id, &update).await {
                Ok(session) => {
                    ctx.apply(issued_at, Some(&user.id), session);
                    toast::settle(
                        ctx.toaster,
                        id,
                        ToastKind::Success,
                        "Success",
                        Some(message.to_string()),
                    );
                }
                Err(e) => {
                    tracing::warn!("Update failed: {}", e);
                    toast::settle(
                        ctx.toaster,
                        id,
                        ToastKind::Error,
                        "Failed to save changes.",
                        Some(e.payload_json()),
                    );
                }
            }
        });
    }

    /// Validate a username draft locally and save it if it passes.
    pub fn save_username(&self, draft: String) {
        let Some(user) = self.current_user() else {
            return;
        };
        match validate_username(&user.username, &draft) {
            Ok(update) => self.update_user(update, "Your username has been updated."),
            Err(e) => {
                toast::notify(
                    self.toaster,
                    ToastKind::Error,
                    e.to_string(),
                    Some(e.description().to_string()),
                );
            }
        }
    }

    pub fn upload_image(&self, slot: ImageSlot, file: UploadFile) {
        let Some(user) = self.current_user() else {
            return;
        };
        let ctx = *self;
        let issued_at = self.logout_count();
        spawn(async move {
            let label = slot.label();
            let mut toaster = ctx.toaster;
            let id = toaster.write().loading(format!("Uploading {}...", slot.field()));
            match ctx.service().upload_image(&user.id, slot, file).await {
                Ok(session) => {
                    ctx.apply(issued_at, Some(&user.id), session);
                    toast::settle(ctx.toaster, id, ToastKind::Success, format!("{label} updated."), None);
                }
                Err(e) => {
                    tracing::warn!("{} upload failed: {}", label, e);
                    toast::settle(
                        ctx.toaster,
                        id,
                        ToastKind::Error,
                        format!("Failed to upload {}.", slot.field()),
                        Some(e.payload_json()),
                    );
                }
            }
        });
    }

    pub fn remove_image(&self, slot: ImageSlot) {
        let Some(user) = self.current_user() else {
            return;
        };
        let ctx = *self;
        let issued_at = self.logout_count();
        spawn(async move {
            let label = slot.label();
            let mut toaster = ctx.toaster;
            let id = toaster.write().loading(format!("Removing {}...", slot.field()));
            match ctx.service().remove_image(&user.id, slot).await {
                Ok(session) => {
                    ctx.apply(issued_at, Some(&user.id), session);
                    toast::settle(ctx.toaster, id, ToastKind::Success, format!("{label} removed."), None);
                }
                Err(e) => {
                    tracing::warn!("{} removal failed: {}", label, e);
                    toast::settle(
                        ctx.toaster,
                        id,
                        ToastKind::Error,
                        format!("Failed to remove {}.", slot.field()),
                        Some(e.payload_json()),
                    );
                }
            }
        });
    }

    pub fn log_out(&self) {
        let mut logouts = self.logouts;
        *logouts.write() += 1;
        let session = self.service().log_out();
        self.set_session(session);
    }
}

/// Get the auth context provided by [`AuthProvider`].
pub fn use_auth() -> AuthContext {
    use_context::<AuthContext>()
}

/// Shorthand for the session signal; re-renders the caller when it changes.
pub fn use_session() -> Signal<Session> {
    use_auth().session()
}

/// Provider component that owns the session for the app's lifetime.
///
/// Restores the persisted session on mount. While the logged-in user is still
/// unverified, the record is re-read periodically so the gate opens once the
/// verification link has been followed.
#[component]
pub fn AuthProvider(
    /// Defaults to the backend described by `icebyte.toml` / the environment.
    #[props(default)]
    service: Option<AuthService>,
    children: Element,
) -> Element {
    let service = use_signal(move || service.unwrap_or_else(crate::make_service));
    let session = use_signal(Session::default);
    let toaster = use_signal(Toaster::default);
    let logouts = use_signal(|| 0);

    let ctx = use_context_provider(|| AuthContext {
        session,
        toaster,
        service,
        logouts,
    });

    use_future(move || async move {
        let issued_at = ctx.logout_count();
        let restored = ctx.service().restore().await;
        ctx.apply(issued_at, None, restored);
    });

    use_future(move || async move {
        loop {
            toast::sleep(VERIFICATION_POLL).await;

            let Some(user) = ctx.current_user() else {
                continue;
            };
            if user.verified {
                continue;
            }
            let issued_at = ctx.logout_count();
            match ctx.service().refresh(&user.id).await {
                Ok(next) => {
                    if next != *ctx.session.peek() {
                        ctx.apply(issued_at, Some(&user.id), next);
                    }
                }
                Err(e) => tracing::debug!("Verification check failed: {}", e),
            }
        }
    });

    rsx! {
        {children}
    }
}

/// Button to log out the current user.
#[component]
pub fn LogoutButton(
    #[props(default = "Log out".to_string())] label: String,
    #[props(default = "".to_string())] class: String,
) -> Element {
    let auth = use_auth();

    rsx! {
        button {
            class: "{class}",
            onclick: move |_| auth.log_out(),
            "{label}"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Call, Mounted, RecordingBackend};
    use api::MemoryBackend;
    use std::time::Duration;
    use store::{AuthCredentials, AuthStore, MemoryAuthStore};

    fn service(backend: &RecordingBackend) -> AuthService {
        AuthService::new(Rc::new(backend.clone()), UploadPolicy::default())
    }

    #[tokio::test]
    async fn test_log_in_calls_backend_once() {
        let backend = RecordingBackend::new();
        backend.memory().insert_user(
            UserRecord {
                email: "a@b.com".to_string(),
                name: "Ada".to_string(),
                verified: true,
                ..Default::default()
            },
            "x",
        );
        let service = service(&backend);

        let session = service.log_in("a@b.com", "x").await.unwrap();
        assert!(session.is_authenticated());
        assert!(!session.loading);
        assert_eq!(
            backend.calls(),
            vec![Call::LogIn("a@b.com".to_string(), "x".to_string())]
        );
    }

    #[tokio::test]
    async fn test_failed_log_in_carries_provider_payload() {
        let backend = RecordingBackend::new();
        let err = service(&backend).log_in("a@b.com", "x").await.unwrap_err();
        assert!(err.payload_json().contains("Failed to authenticate."));
    }

    #[tokio::test]
    async fn test_session_urls_follow_uploads() {
        let backend = RecordingBackend::new();
        let user = backend.memory().insert_user(
            UserRecord {
                email: "me@example.com".to_string(),
                ..Default::default()
            },
            "password-2",
        );
        let service = service(&backend);
        let session = service.log_in("me@example.com", "password-2").await.unwrap();
        assert_eq!(session.avatar_url, None);

        let session = service
            .upload_image(&user.id, ImageSlot::Avatar, UploadFile::new("me.png", vec![1]))
            .await
            .unwrap();
        let avatar = session.image_url(ImageSlot::Avatar).unwrap();
        assert!(avatar.ends_with(&session.user.as_ref().unwrap().avatar));
        assert_eq!(session.banner_url, None);

        let session = service.remove_image(&user.id, ImageSlot::Avatar).await.unwrap();
        assert_eq!(session.avatar_url, None);
    }

    #[tokio::test]
    async fn test_restore_from_persisted_credentials() {
        let memory = MemoryBackend::new();
        let user = memory.insert_user(
            UserRecord {
                email: "me@example.com".to_string(),
                verified: true,
                ..Default::default()
            },
            "password-2",
        );
        memory.log_in("me@example.com", "password-2").await.unwrap();
        let service = AuthService::new(Rc::new(memory.clone()), UploadPolicy::default());

        let session = service.restore().await;
        assert_eq!(session.user.map(|u| u.id), Some(user.id));
        assert!(!session.loading);
    }

    #[tokio::test]
    async fn test_restore_with_rejected_token_signs_out() {
        let store = MemoryAuthStore::with_credentials(AuthCredentials {
            token: "expired".to_string(),
            record: UserRecord {
                id: "gone".to_string(),
                ..Default::default()
            },
        });
        let service = AuthService::new(
            Rc::new(MemoryBackend::with_auth_store(store.clone())),
            UploadPolicy::default(),
        );

        assert_eq!(service.restore().await, Session::signed_out());
        assert!(store.load().is_none());
    }

    #[tokio::test]
    async fn test_log_out_clears_persisted_session() {
        let backend = RecordingBackend::new();
        backend.memory().insert_user(
            UserRecord {
                email: "me@example.com".to_string(),
                ..Default::default()
            },
            "password-2",
        );
        let service = service(&backend);
        service.log_in("me@example.com", "password-2").await.unwrap();

        assert_eq!(service.log_out(), Session::signed_out());
        assert_eq!(service.restore().await, Session::signed_out());
    }

    #[tokio::test]
    async fn test_refresh_picks_up_verification() {
        let backend = RecordingBackend::new();
        let registration = Registration {
            name: "Ada".to_string(),
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "engine-42".to_string(),
            password_confirm: "engine-42".to_string(),
        };
        let service = service(&backend);
        let session = service.register(&registration).await.unwrap();
        let user = session.user.unwrap();
        assert!(!user.verified);

        backend.memory().mark_verified("ada@example.com");
        let session = service.refresh(&user.id).await.unwrap();
        assert!(session.user.unwrap().verified);
    }

    /// A verified user "ada" with a persisted session in `backend`.
    async fn signed_in(backend: &RecordingBackend) -> UserRecord {
        let user = backend.memory().insert_user(
            UserRecord {
                email: "ada@example.com".to_string(),
                username: "ada".to_string(),
                verified: true,
                ..Default::default()
            },
            "engine-42",
        );
        backend
            .memory()
            .log_in("ada@example.com", "engine-42")
            .await
            .unwrap();
        user
    }

    fn last_toast(mounted: &Mounted) -> Option<crate::toast::Toast> {
        mounted.act(|auth| auth.toaster().peek().toasts().last().cloned())
    }

    #[tokio::test]
    async fn test_unchanged_username_shows_toast_without_calling() {
        let backend = RecordingBackend::new();
        signed_in(&backend).await;
        let mut mounted = Mounted::new(service(&backend)).await;

        mounted.act(|auth| auth.save_username("ada".to_string()));
        mounted.drive(Duration::from_millis(30)).await;

        let toast = last_toast(&mounted).unwrap();
        assert_eq!(toast.kind, ToastKind::Error);
        assert_eq!(toast.title, "No changes were made.");
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_username_shows_toast_without_calling() {
        let backend = RecordingBackend::new();
        signed_in(&backend).await;
        let mut mounted = Mounted::new(service(&backend)).await;

        mounted.act(|auth| auth.save_username("a".to_string()));
        mounted.drive(Duration::from_millis(30)).await;

        let toast = last_toast(&mounted).unwrap();
        assert_eq!(toast.kind, ToastKind::Error);
        assert_eq!(toast.title, "Invalid username.");
        assert_eq!(
            toast.description.as_deref(),
            Some("Your username must be between 2 and 12 characters long.")
        );
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_valid_username_is_saved_once() {
        let backend = RecordingBackend::new();
        let user = signed_in(&backend).await;
        let mut mounted = Mounted::new(service(&backend)).await;

        mounted.act(|auth| auth.save_username("lovelace".to_string()));
        mounted.drive(Duration::from_millis(50)).await;

        assert_eq!(
            backend.calls(),
            vec![Call::Update(user.id, UserUpdate::username("lovelace"))]
        );
        let toast = last_toast(&mounted).unwrap();
        assert_eq!(toast.kind, ToastKind::Success);
        assert_eq!(
            toast.description.as_deref(),
            Some("Your username has been updated.")
        );
        let username = mounted.act(|auth| {
            auth.session()
                .peek()
                .user
                .as_ref()
                .map(|u| u.username.clone())
        });
        assert_eq!(username.as_deref(), Some("lovelace"));
    }

    #[tokio::test]
    async fn test_late_update_does_not_restore_a_logged_out_session() {
        let backend = RecordingBackend::with_update_delay(Duration::from_millis(100));
        signed_in(&backend).await;
        let mut mounted = Mounted::new(service(&backend)).await;
        assert!(mounted.act(|auth| auth.session().peek().is_authenticated()));

        mounted.act(|auth| auth.save_username("lovelace".to_string()));
        mounted.drive(Duration::from_millis(20)).await;
        mounted.act(|auth| auth.log_out());
        mounted.drive(Duration::from_millis(250)).await;

        let session = mounted.act(|auth| auth.session().peek().clone());
        assert_eq!(session, Session::signed_out());
        assert!(backend.memory().auth_store().load().is_none());
        // The loading toast still settles
        let toast = last_toast(&mounted).unwrap();
        assert_eq!(toast.kind, ToastKind::Success);
    }

    #[tokio::test]
    async fn test_log_in_finishing_after_log_out_is_dropped() {
        let backend = RecordingBackend::new();
        backend.memory().insert_user(
            UserRecord {
                email: "ada@example.com".to_string(),
                verified: true,
                ..Default::default()
            },
            "engine-42",
        );
        let mut mounted = Mounted::new(service(&backend)).await;

        // Both run inside the same tick: the login is still pending at logout
        mounted.act(|auth| {
            auth.log_in("ada@example.com".to_string(), "engine-42".to_string());
            auth.log_out();
        });
        mounted.drive(Duration::from_millis(50)).await;

        assert_eq!(
            backend.calls(),
            vec![Call::LogIn("ada@example.com".to_string(), "engine-42".to_string())]
        );
        let session = mounted.act(|auth| auth.session().peek().clone());
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_failed_verification_request_settles_error_toast() {
        let backend = RecordingBackend::with_failing_verification();
        let mut mounted = Mounted::new(service(&backend)).await;

        mounted.act(|auth| auth.request_verification("ada@example.com".to_string()));
        mounted.drive(Duration::from_millis(30)).await;

        assert_eq!(
            backend.calls(),
            vec![Call::RequestVerification("ada@example.com".to_string())]
        );
        let toasts = mounted.act(|auth| auth.toaster().peek().toasts().to_vec());
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].kind, ToastKind::Error);
        assert_eq!(toasts[0].title, "Failed to send verification email.");
    }
}
