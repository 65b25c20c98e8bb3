//! # PocketBase HTTP client
//!
//! [`PocketBaseClient`] implements [`Backend`] against a PocketBase server's
//! REST API for a single auth collection (normally `users`).
//!
//! | Operation | Request |
//! |-----------|---------|
//! | `log_in` | `POST /api/collections/{c}/auth-with-password` `{identity, password}` |
//! | `register` | `POST /api/collections/{c}/records`, then `request-verification`, then `log_in` |
//! | `reset_password` | `POST /api/collections/{c}/request-password-reset` `{email}` |
//! | `request_verification` | `POST /api/collections/{c}/request-verification` `{email}` |
//! | `update` | `PATCH /api/collections/{c}/records/{id}` JSON |
//! | `upload_image` | same `PATCH`, multipart with the slot field |
//! | `remove_image` | same `PATCH`, JSON `{slot: null}` |
//! | `restore` | `POST /api/collections/{c}/auth-refresh` |
//! | `fetch_user` | `GET /api/collections/{c}/records/{id}` |
//!
//! Authenticated requests carry the stored token in the `Authorization` header.
//! Successful auth responses and record updates of the logged-in user are
//! written back to the [`AuthStore`] so a reload restores the latest record.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use store::{AuthStore, BackendConfig};

use crate::backend::{Backend, Result};
use crate::error::BackendError;
use crate::models::{AuthCredentials, ImageSlot, Registration, UploadFile, UserRecord, UserUpdate};

#[derive(Debug, Deserialize)]
struct AuthResponse {
    token: String,
    record: UserRecord,
}

pub struct PocketBaseClient {
    http: Client,
    base_url: String,
    collection: String,
    auth_store: Box<dyn AuthStore>,
}

impl PocketBaseClient {
    pub fn new(config: &BackendConfig, auth_store: Box<dyn AuthStore>) -> Self {
        Self {
            http: Client::new(),
            base_url: config.url.trim_end_matches('/').to_string(),
            collection: config.collection.clone(),
            auth_store,
        }
    }

    fn collection_url(&self, path: &str) -> String {
        format!(
            "{}/api/collections/{}/{}",
            self.base_url, self.collection, path
        )
    }

    fn record_url(&self, id: &str) -> String {
        self.collection_url(&format!("records/{id}"))
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let credentials = self.auth_store.load().ok_or(BackendError::NotAuthenticated)?;
        Ok(request.header(reqwest::header::AUTHORIZATION, credentials.token))
    }

    /// Turn a non-success response into [`BackendError::Api`] carrying the body.
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        let payload = match serde_json::from_str::<Value>(&text) {
            Ok(payload) => payload,
            Err(_) => {
                let message = if text.is_empty() { status.to_string() } else { text };
                json!({ "code": status.as_u16(), "message": message, "data": {} })
            }
        };
        Err(BackendError::Api {
            status: status.as_u16(),
            payload,
        })
    }

    async fn send_record(&self, request: RequestBuilder) -> Result<UserRecord> {
        let response = Self::check(request.send().await?).await?;
        let record: UserRecord = response.json().await?;
        self.remember_record(&record);
        Ok(record)
    }

    async fn send_auth(&self, request: RequestBuilder) -> Result<UserRecord> {
        let response = Self::check(request.send().await?).await?;
        let auth: AuthResponse = response.json().await?;
        self.auth_store.save(&AuthCredentials {
            token: auth.token,
            record: auth.record.clone(),
        });
        Ok(auth.record)
    }

    /// Keep the persisted record in step with edits to the logged-in user.
    fn remember_record(&self, record: &UserRecord) {
        if let Some(mut credentials) = self.auth_store.load() {
            if credentials.record.id == record.id {
                credentials.record = record.clone();
                self.auth_store.save(&credentials);
            }
        }
    }
}

#[async_trait(?Send)]
impl Backend for PocketBaseClient {
    async fn log_in(&self, email: &str, password: &str) -> Result<UserRecord> {
        let request = self
            .http
            .post(self.collection_url("auth-with-password"))
            .json(&json!({ "identity": email, "password": password }));
        let record = self.send_auth(request).await?;
        tracing::info!("Logged in as {}", record.id);
        Ok(record)
    }

    async fn register(&self, registration: &Registration) -> Result<UserRecord> {
        let response = self
            .http
            .post(self.collection_url("records"))
            .json(registration)
            .send()
            .await?;
        Self::check(response).await?;

        if let Err(e) = self.request_verification(&registration.email).await {
            tracing::warn!("Account created but verification email failed: {}", e);
        }

        self.log_in(&registration.email, &registration.password).await
    }

    async fn reset_password(&self, email: &str) -> Result<()> {
        let response = self
            .http
            .post(self.collection_url("request-password-reset"))
            .json(&json!({ "email": email }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn request_verification(&self, email: &str) -> Result<()> {
        let response = self
            .http
            .post(self.collection_url("request-verification"))
            .json(&json!({ "email": email }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn update(&self, user_id: &str, update: &UserUpdate) -> Result<UserRecord> {
        let request = self.authorized(self.http.patch(self.record_url(user_id)))?;
        self.send_record(request.json(update)).await
    }

    async fn upload_image(
        &self,
        user_id: &str,
        slot: ImageSlot,
        file: UploadFile,
    ) -> Result<UserRecord> {
        let mut part = Part::bytes(file.bytes).file_name(file.name);
        if let Some(content_type) = file.content_type.as_deref() {
            part = part.mime_str(content_type)?;
        }
        let form = Form::new().part(slot.field(), part);
        let request = self.authorized(self.http.patch(self.record_url(user_id)))?;
        self.send_record(request.multipart(form)).await
    }

    async fn remove_image(&self, user_id: &str, slot: ImageSlot) -> Result<UserRecord> {
        let mut body = Map::new();
        body.insert(slot.field().to_string(), Value::Null);
        let request = self.authorized(self.http.patch(self.record_url(user_id)))?;
        self.send_record(request.json(&body)).await
    }

    async fn restore(&self) -> Result<Option<UserRecord>> {
        if self.auth_store.load().is_none() {
            return Ok(None);
        }
        let request = self.authorized(self.http.post(self.collection_url("auth-refresh")))?;
        match self.send_auth(request).await {
            Ok(record) => Ok(Some(record)),
            Err(e @ BackendError::Api { .. }) => {
                // The token was rejected; keeping it would fail every later call.
                self.auth_store.clear();
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    async fn fetch_user(&self, user_id: &str) -> Result<UserRecord> {
        let request = self.authorized(self.http.get(self.record_url(user_id)))?;
        self.send_record(request).await
    }

    fn log_out(&self) {
        self.auth_store.clear();
    }

    fn file_url(&self, record: &UserRecord, filename: &str) -> Option<String> {
        if filename.is_empty() || record.id.is_empty() {
            return None;
        }
        let collection = if record.collection_id.is_empty() {
            &record.collection_name
        } else {
            &record.collection_id
        };
        Some(format!(
            "{}/api/files/{}/{}/{}",
            self.base_url, collection, record.id, filename
        ))
    }
}
