//! Errors returned by every [`crate::Backend`] operation.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend answered with a non-success status. `payload` is the
    /// provider's error body, kept verbatim for display.
    #[error("backend rejected the request ({status}): {}", payload_message(.payload))]
    Api { status: u16, payload: Value },

    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("not authenticated")]
    NotAuthenticated,
}

impl BackendError {
    /// Build an `Api` error in the provider's `{code, message, data}` shape.
    pub fn api(status: u16, message: impl Into<String>, data: Value) -> Self {
        BackendError::Api {
            status,
            payload: serde_json::json!({
                "code": status,
                "message": message.into(),
                "data": data,
            }),
        }
    }

    /// The provider payload serialised for a notification description.
    /// Errors that never reached the provider fall back to their message.
    pub fn payload_json(&self) -> String {
        match self {
            BackendError::Api { payload, .. } => payload.to_string(),
            other => serde_json::json!({ "message": other.to_string() }).to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn payload_message(payload: &Value) -> String {
    payload
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| payload.to_string())
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            BackendError::Decode(err.to_string())
        } else {
            BackendError::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_api_error_keeps_payload_verbatim() {
        let err = BackendError::Api {
            status: 400,
            payload: json!({
                "code": 400,
                "message": "Failed to update record.",
                "data": { "username": { "code": "validation_not_unique", "message": "Value must be unique." } }
            }),
        };
        assert_eq!(err.status(), Some(400));
        assert_eq!(
            err.to_string(),
            "backend rejected the request (400): Failed to update record."
        );
        let shown: Value = serde_json::from_str(&err.payload_json()).unwrap();
        assert_eq!(shown["data"]["username"]["code"], "validation_not_unique");
    }

    #[test]
    fn test_local_errors_render_as_json() {
        let shown: Value =
            serde_json::from_str(&BackendError::NotAuthenticated.payload_json()).unwrap();
        assert_eq!(shown["message"], "not authenticated");
    }
}
