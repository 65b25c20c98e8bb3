//! Test doubles: a [`Backend`] that records every call before delegating to
//! [`MemoryBackend`], a mounted [`AuthProvider`] to drive [`AuthContext`]
//! methods, and a picked file that reports whether it was read.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use api::{
    Backend, BackendError, ImageSlot, MemoryBackend, Registration, UploadFile, UserRecord,
    UserUpdate,
};
use async_trait::async_trait;
use dioxus::dioxus_core::NoOpMutations;
use dioxus::html::bytes::Bytes;
use dioxus::html::{FileData, NativeFileData};
use dioxus::prelude::*;
use dioxus::CapturedError;
use futures_util::Stream;

use crate::session::{use_auth, AuthContext, AuthProvider, AuthService};

type Result<T, E = BackendError> = std::result::Result<T, E>;

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    LogIn(String, String),
    Register(String),
    ResetPassword(String),
    RequestVerification(String),
    Update(String, UserUpdate),
    Upload(String, ImageSlot, String),
    Remove(String, ImageSlot),
    FetchUser(String),
}

#[derive(Clone, Default)]
pub struct RecordingBackend {
    inner: MemoryBackend,
    calls: Rc<RefCell<Vec<Call>>>,
    update_delay: Option<Duration>,
    fail_verification: bool,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates are applied at once but only answered after `delay`.
    pub fn with_update_delay(delay: Duration) -> Self {
        Self {
            update_delay: Some(delay),
            ..Self::default()
        }
    }

    /// Verification email requests fail as if the provider were down.
    pub fn with_failing_verification() -> Self {
        Self {
            fail_verification: true,
            ..Self::default()
        }
    }

    pub fn memory(&self) -> &MemoryBackend {
        &self.inner
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

#[async_trait(?Send)]
impl Backend for RecordingBackend {
    async fn log_in(&self, email: &str, password: &str) -> Result<UserRecord> {
        self.record(Call::LogIn(email.to_string(), password.to_string()));
        self.inner.log_in(email, password).await
    }

    async fn register(&self, registration: &Registration) -> Result<UserRecord> {
        self.record(Call::Register(registration.email.clone()));
        self.inner.register(registration).await
    }

    async fn reset_password(&self, email: &str) -> Result<()> {
        self.record(Call::ResetPassword(email.to_string()));
        self.inner.reset_password(email).await
    }

    async fn request_verification(&self, email: &str) -> Result<()> {
        self.record(Call::RequestVerification(email.to_string()));
        if self.fail_verification {
            return Err(BackendError::Network("connection refused".to_string()));
        }
        self.inner.request_verification(email).await
    }

    async fn update(&self, user_id: &str, update: &UserUpdate) -> Result<UserRecord> {
        self.record(Call::Update(user_id.to_string(), update.clone()));
        let result = self.inner.update(user_id, update).await;
        if let Some(delay) = self.update_delay {
            tokio::time::sleep(delay).await;
        }
        result
    }

    async fn upload_image(
        &self,
        user_id: &str,
        slot: ImageSlot,
        file: UploadFile,
    ) -> Result<UserRecord> {
        self.record(Call::Upload(user_id.to_string(), slot, file.name.clone()));
        self.inner.upload_image(user_id, slot, file).await
    }

    async fn remove_image(&self, user_id: &str, slot: ImageSlot) -> Result<UserRecord> {
        self.record(Call::Remove(user_id.to_string(), slot));
        self.inner.remove_image(user_id, slot).await
    }

    async fn restore(&self) -> Result<Option<UserRecord>> {
        self.inner.restore().await
    }

    async fn fetch_user(&self, user_id: &str) -> Result<UserRecord> {
        self.record(Call::FetchUser(user_id.to_string()));
        self.inner.fetch_user(user_id).await
    }

    fn log_out(&self) {
        self.inner.log_out()
    }

    fn file_url(&self, record: &UserRecord, filename: &str) -> Option<String> {
        self.inner.file_url(record, filename)
    }
}

#[derive(Clone, Default)]
struct Captured(Rc<Cell<Option<AuthContext>>>);

impl PartialEq for Captured {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

#[component]
fn Harness(service: AuthService, captured: Captured) -> Element {
    rsx! {
        AuthProvider {
            service,
            Capture { captured }
        }
    }
}

#[component]
fn Capture(captured: Captured) -> Element {
    captured.0.set(Some(use_auth()));
    rsx! {}
}

/// An [`AuthProvider`] mounted in a headless `VirtualDom`.
pub struct Mounted {
    pub dom: VirtualDom,
    pub auth: AuthContext,
}

impl Mounted {
    pub async fn new(service: AuthService) -> Self {
        let captured = Captured::default();
        let mut dom = VirtualDom::new_with_props(
            Harness,
            HarnessProps {
                service,
                captured: captured.clone(),
            },
        );
        dom.rebuild_in_place();
        let auth = captured.0.get().expect("AuthProvider did not render");
        let mut mounted = Self { dom, auth };
        // Let the session restore finish
        mounted.drive(Duration::from_millis(50)).await;
        mounted
    }

    /// Run `f` inside the app scope, where `AuthContext` methods can spawn.
    pub fn act<T>(&self, f: impl FnOnce(AuthContext) -> T) -> T {
        let auth = self.auth;
        self.dom.in_scope(ScopeId::APP, || f(auth))
    }

    /// Poll tasks and re-render for roughly `duration`.
    pub async fn drive(&mut self, duration: Duration) {
        let deadline = tokio::time::Instant::now() + duration;
        while tokio::time::Instant::now() < deadline {
            let _ = tokio::time::timeout(Duration::from_millis(10), self.dom.wait_for_work())
                .await;
            self.dom.render_immediate(&mut NoOpMutations);
        }
    }
}

/// A picked file of a given size whose contents are zeros.
pub struct PickedFile {
    name: String,
    size: u64,
    read: Arc<AtomicBool>,
}

impl PickedFile {
    /// The file, plus a flag set once anything asks for its bytes.
    pub fn new(name: &str, size: u64) -> (FileData, Arc<AtomicBool>) {
        let read = Arc::new(AtomicBool::new(false));
        let file = FileData::new(PickedFile {
            name: name.to_string(),
            size,
            read: read.clone(),
        });
        (file, read)
    }
}

impl NativeFileData for PickedFile {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn last_modified(&self) -> u64 {
        0
    }

    fn path(&self) -> PathBuf {
        PathBuf::from(&self.name)
    }

    fn content_type(&self) -> Option<String> {
        None
    }

    fn read_bytes(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Bytes, CapturedError>> + 'static>> {
        self.read.store(true, Ordering::SeqCst);
        let len = self.size as usize;
        Box::pin(async move { Ok(Bytes::from(vec![0u8; len])) })
    }

    fn byte_stream(
        &self,
    ) -> Pin<Box<dyn Stream<Item = Result<Bytes, CapturedError>> + 'static + Send>> {
        self.read.store(true, Ordering::SeqCst);
        Box::pin(futures_util::stream::empty())
    }

    fn read_string(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<String, CapturedError>> + 'static>> {
        self.read.store(true, Ordering::SeqCst);
        Box::pin(async { Ok(String::new()) })
    }

    fn inner(&self) -> &dyn std::any::Any {
        self
    }
}
