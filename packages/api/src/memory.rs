//! # In-memory backend
//!
//! [`MemoryBackend`] keeps accounts, tokens and uploaded files in process
//! memory. It behaves like the hosted backend where the UI can observe it:
//!
//! - new accounts start unverified and a verification email is "sent"
//!   (recorded in [`MemoryBackend::outbox`]);
//! - usernames and emails are unique, passwords need 8+ characters and must
//!   match their confirmation;
//! - bad credentials and validation failures come back as
//!   [`BackendError::Api`] with the provider's `{code, message, data}` payload;
//! - record edits require the logged-in user's token.
//!
//! Used by the tests and for running the UI without a backend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::{json, Value};
use store::{AuthStore, MemoryAuthStore};

use crate::backend::{Backend, Result};
use crate::error::BackendError;
use crate::models::{AuthCredentials, ImageSlot, Registration, UploadFile, UserRecord, UserUpdate};

const COLLECTION_ID: &str = "_pb_users_auth_";
const COLLECTION_NAME: &str = "users";
const MIN_PASSWORD_LEN: usize = 8;

/// Kind of email the backend would have sent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mail {
    Verification(String),
    PasswordReset(String),
}

#[derive(Clone, Debug)]
struct Account {
    record: UserRecord,
    password: String,
}

#[derive(Debug, Default)]
struct State {
    accounts: HashMap<String, Account>,
    tokens: HashMap<String, String>,
    files: HashMap<(String, String), Vec<u8>>,
    outbox: Vec<Mail>,
}

impl State {
    fn find_by_identity(&self, identity: &str) -> Option<&Account> {
        self.accounts
            .values()
            .find(|a| a.record.email == identity || a.record.username == identity)
    }

    fn username_taken(&self, username: &str, except_id: Option<&str>) -> bool {
        self.accounts
            .values()
            .any(|a| a.record.username == username && Some(a.record.id.as_str()) != except_id)
    }
}

#[derive(Clone, Debug, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<State>>,
    auth_store: MemoryAuthStore,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an existing auth store, e.g. one shared with a previous backend
    /// instance to simulate an app restart.
    pub fn with_auth_store(auth_store: MemoryAuthStore) -> Self {
        Self {
            state: Arc::default(),
            auth_store,
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add an account directly, bypassing registration.
    pub fn insert_user(&self, record: UserRecord, password: &str) -> UserRecord {
        let mut record = record;
        if record.id.is_empty() {
            record.id = new_id();
        }
        record.collection_id = COLLECTION_ID.to_string();
        record.collection_name = COLLECTION_NAME.to_string();
        self.state().accounts.insert(
            record.id.clone(),
            Account {
                record: record.clone(),
                password: password.to_string(),
            },
        );
        record
    }

    /// Simulate the user following the link in the verification email.
    pub fn mark_verified(&self, email: &str) -> bool {
        let mut state = self.state();
        match state.accounts.values_mut().find(|a| a.record.email == email) {
            Some(account) => {
                account.record.verified = true;
                true
            }
            None => false,
        }
    }

    /// Emails "sent" so far, oldest first.
    pub fn outbox(&self) -> Vec<Mail> {
        self.state().outbox.clone()
    }

    pub fn user(&self, user_id: &str) -> Option<UserRecord> {
        self.state().accounts.get(user_id).map(|a| a.record.clone())
    }

    pub fn stored_file(&self, user_id: &str, filename: &str) -> Option<Vec<u8>> {
        self.state()
            .files
            .get(&(user_id.to_string(), filename.to_string()))
            .cloned()
    }

    pub fn auth_store(&self) -> &MemoryAuthStore {
        &self.auth_store
    }

    fn issue_token(&self, record: &UserRecord) {
        let token = new_id();
        self.state().tokens.insert(token.clone(), record.id.clone());
        self.auth_store.save(&AuthCredentials {
            token,
            record: record.clone(),
        });
    }

    /// The user id the stored token belongs to, if the token is still valid.
    fn current_user_id(&self) -> Option<String> {
        let credentials = self.auth_store.load()?;
        self.state().tokens.get(&credentials.token).cloned()
    }

    fn require_owner(&self, user_id: &str) -> Result<()> {
        match self.current_user_id() {
            None => Err(BackendError::NotAuthenticated),
            Some(id) if id == user_id => Ok(()),
            Some(_) => Err(BackendError::api(
                403,
                "Only the record owner can perform this action.",
                json!({}),
            )),
        }
    }

    fn saved(&self, record: UserRecord) -> UserRecord {
        if let Some(mut credentials) = self.auth_store.load() {
            if credentials.record.id == record.id {
                credentials.record = record.clone();
                self.auth_store.save(&credentials);
            }
        }
        record
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

fn field_error(code: &str, message: &str) -> Value {
    json!({ "code": code, "message": message })
}

fn validate_registration(registration: &Registration, state: &State) -> Option<Value> {
    let mut data = serde_json::Map::new();
    if registration.email.trim().is_empty() || !registration.email.contains('@') {
        data.insert(
            "email".into(),
            field_error("validation_is_email", "Must be a valid email address."),
        );
    } else if state.find_by_identity(&registration.email).is_some() {
        data.insert(
            "email".into(),
            field_error("validation_invalid_email", "The email is invalid or already in use."),
        );
    }
    if !registration.username.is_empty() && state.username_taken(&registration.username, None) {
        data.insert(
            "username".into(),
            field_error("validation_invalid_username", "The username is invalid or already in use."),
        );
    }
    if registration.password.chars().count() < MIN_PASSWORD_LEN {
        data.insert(
            "password".into(),
            field_error("validation_length_out_of_range", "The length must be between 8 and 72."),
        );
    }
    if registration.password != registration.password_confirm {
        data.insert(
            "passwordConfirm".into(),
            field_error("validation_values_mismatch", "Values don't match."),
        );
    }
    (!data.is_empty()).then_some(Value::Object(data))
}

#[async_trait(?Send)]
impl Backend for MemoryBackend {
    async fn log_in(&self, email: &str, password: &str) -> Result<UserRecord> {
        let record = {
            let state = self.state();
            match state.find_by_identity(email) {
                Some(account) if account.password == password => account.record.clone(),
                _ => {
                    return Err(BackendError::api(400, "Failed to authenticate.", json!({})));
                }
            }
        };
        self.issue_token(&record);
        Ok(record)
    }

    async fn register(&self, registration: &Registration) -> Result<UserRecord> {
        {
            let state = self.state();
            if let Some(data) = validate_registration(registration, &state) {
                return Err(BackendError::api(400, "Failed to create record.", data));
            }
        }
        let username = if registration.username.is_empty() {
            format!("users{}", &new_id()[..5])
        } else {
            registration.username.clone()
        };
        self.insert_user(
            UserRecord {
                name: registration.name.clone(),
                username,
                email: registration.email.clone(),
                verified: false,
                ..Default::default()
            },
            &registration.password,
        );
        self.request_verification(&registration.email).await?;
        self.log_in(&registration.email, &registration.password).await
    }

    async fn reset_password(&self, email: &str) -> Result<()> {
        let mut state = self.state();
        // Unknown addresses succeed too, so accounts cannot be enumerated.
        if state.find_by_identity(email).is_some() {
            state.outbox.push(Mail::PasswordReset(email.to_string()));
        }
        Ok(())
    }

    async fn request_verification(&self, email: &str) -> Result<()> {
        let mut state = self.state();
        let unverified = state
            .accounts
            .values()
            .any(|a| a.record.email == email && !a.record.verified);
        if unverified {
            state.outbox.push(Mail::Verification(email.to_string()));
        }
        Ok(())
    }

    async fn update(&self, user_id: &str, update: &UserUpdate) -> Result<UserRecord> {
        self.require_owner(user_id)?;
        let record = {
            let mut state = self.state();
            if let Some(username) = &update.username {
                if state.username_taken(username, Some(user_id)) {
                    return Err(BackendError::api(
                        400,
                        "Failed to update record.",
                        json!({ "username": field_error("validation_not_unique", "Value must be unique.") }),
                    ));
                }
            }
            let account = state
                .accounts
                .get_mut(user_id)
                .ok_or_else(|| BackendError::api(404, "The requested resource wasn't found.", json!({})))?;
            if let Some(username) = &update.username {
                account.record.username = username.clone();
            }
            if let Some(name) = &update.name {
                account.record.name = name.clone();
            }
            account.record.clone()
        };
        Ok(self.saved(record))
    }

    async fn upload_image(
        &self,
        user_id: &str,
        slot: ImageSlot,
        file: UploadFile,
    ) -> Result<UserRecord> {
        self.require_owner(user_id)?;
        let stored_name = match file.name.rsplit_once('.') {
            Some((stem, ext)) => format!("{stem}_{}.{ext}", &new_id()[..10]),
            None => format!("{}_{}", file.name, &new_id()[..10]),
        };
        let record = {
            let mut state = self.state();
            let account = state
                .accounts
                .get_mut(user_id)
                .ok_or_else(|| BackendError::api(404, "The requested resource wasn't found.", json!({})))?;
            let previous = match slot {
                ImageSlot::Avatar => std::mem::replace(&mut account.record.avatar, stored_name.clone()),
                ImageSlot::Banner => std::mem::replace(&mut account.record.banner, stored_name.clone()),
            };
            let record = account.record.clone();
            state.files.remove(&(user_id.to_string(), previous));
            state
                .files
                .insert((user_id.to_string(), stored_name), file.bytes);
            record
        };
        Ok(self.saved(record))
    }

    async fn remove_image(&self, user_id: &str, slot: ImageSlot) -> Result<UserRecord> {
        self.require_owner(user_id)?;
        let record = {
            let mut state = self.state();
            let account = state
                .accounts
                .get_mut(user_id)
                .ok_or_else(|| BackendError::api(404, "The requested resource wasn't found.", json!({})))?;
            let previous = match slot {
                ImageSlot::Avatar => std::mem::take(&mut account.record.avatar),
                ImageSlot::Banner => std::mem::take(&mut account.record.banner),
            };
            let record = account.record.clone();
            state.files.remove(&(user_id.to_string(), previous));
            record
        };
        Ok(self.saved(record))
    }

    async fn restore(&self) -> Result<Option<UserRecord>> {
        if self.auth_store.load().is_none() {
            return Ok(None);
        }
        let record = self
            .current_user_id()
            .and_then(|id| self.state().accounts.get(&id).map(|a| a.record.clone()));
        match record {
            Some(record) => Ok(Some(self.saved(record))),
            None => {
                self.auth_store.clear();
                Err(BackendError::api(401, "The request requires valid record authorization token.", json!({})))
            }
        }
    }

    async fn fetch_user(&self, user_id: &str) -> Result<UserRecord> {
        self.require_owner(user_id)?;
        let record = self
            .user(user_id)
            .ok_or_else(|| BackendError::api(404, "The requested resource wasn't found.", json!({})))?;
        Ok(self.saved(record))
    }

    fn log_out(&self) {
        if let Some(credentials) = self.auth_store.load() {
            self.state().tokens.remove(&credentials.token);
        }
        self.auth_store.clear();
    }

    fn file_url(&self, record: &UserRecord, filename: &str) -> Option<String> {
        (!filename.is_empty()).then(|| format!("memory://{}/{}/{}", COLLECTION_ID, record.id, filename))
    }
}
