use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error body returned by the remote API on non-success responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation_url: Option<String>,
}

impl ApiErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            documentation_url: None,
        }
    }
}

#[derive(Debug, Error)]
#[error("remote API returned {status}: {message}")]
pub struct ApiException {
    pub status: u16,
    pub message: String,
}

impl ApiException {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Builds the exception from a raw response body, falling back to the
    /// body text when it is not the documented JSON shape.
    pub fn from_body(status: u16, body: &str) -> Self {
        let message = match serde_json::from_str::<ApiErrorBody>(body) {
            Ok(parsed) if !parsed.message.trim().is_empty() => parsed.message,
            _ if body.trim().is_empty() => format!("HTTP {status}"),
            _ => body.trim().to_string(),
        };
        Self { status, message }
    }
}
