use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Local;
use serde::Serialize;

/// Flat error body shared by every non-success response.
///
/// ```json
/// {"success": false, "error": "问题不能为空", "error_code": "EMPTY_QUESTION", "timestamp": "..."}
/// ```
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    /// Human-facing message.
    pub error: String,
    /// Stable, machine-readable code (e.g. "INVALID_REQUEST").
    pub error_code: &'static str,
    pub timestamp: String,
    /// Raw rejection text from the extractor, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ErrorEnvelope {
    pub fn new(error_code: &'static str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
            error_code,
            timestamp: now_iso(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        if !detail.trim().is_empty() {
            self.detail = Some(detail);
        }
        self
    }

    /// Convert to axum Response.
    pub fn into_response_with_status(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

/// Local time in RFC 3339, used for every `timestamp` field.
pub fn now_iso() -> String {
    Local::now().to_rfc3339()
}
