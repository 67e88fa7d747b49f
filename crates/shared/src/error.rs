use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unauthorized,
    Forbidden,
    NotFound,
    Validation,
    RateLimited,
    Internal,
}

impl ErrorCode {
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => ErrorCode::Unauthorized,
            403 => ErrorCode::Forbidden,
            404 => ErrorCode::NotFound,
            400 | 409 | 422 => ErrorCode::Validation,
            429 => ErrorCode::RateLimited,
            _ => ErrorCode::Internal,
        }
    }
}

/// Error payload returned by the backend. Either `message` or a string
/// `detail` may carry the human-readable text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
}

impl ApiErrorBody {
    pub fn into_message(self, fallback: impl Into<String>) -> String {
        if let Some(message) = self.message.filter(|m| !m.trim().is_empty()) {
            return message;
        }
        if let Some(serde_json::Value::String(detail)) = self.detail {
            if !detail.trim().is_empty() {
                return detail;
            }
        }
        fallback.into()
    }
}

#[derive(Debug, Clone, Error)]
#[error("{code:?}: {message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn from_response(status: u16, body: Option<ApiErrorBody>, status_text: &str) -> Self {
        let message = match body {
            Some(body) => body.into_message(status_text),
            None => status_text.to_string(),
        };
        Self::new(ErrorCode::from_status(status), message)
    }
}
