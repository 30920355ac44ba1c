use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::LlmError;

/// Application-level error type.
/// Every variant is terminal for the request that produced it; nothing is retried.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Document format error: {0}")]
    DocumentFormat(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Upload exceeds the {limit} byte limit")]
    PayloadTooLarge { limit: usize },

    #[error("Remote call error: {0}")]
    RemoteCall(String),

    #[error("Remote call timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Response format error: {message}")]
    ResponseFormat { message: String, raw: String },

    #[error("Schema error: missing or invalid field '{field}'")]
    Schema { field: String, raw: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::DocumentFormat(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::RemoteCall(_)
            | AppError::ResponseFormat { .. }
            | AppError::Schema { .. } => StatusCode::BAD_GATEWAY,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Configuration(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::DocumentFormat(_) => "DOCUMENT_FORMAT_ERROR",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            AppError::RemoteCall(_) => "REMOTE_CALL_ERROR",
            AppError::Timeout(_) => "TIMEOUT_ERROR",
            AppError::ResponseFormat { .. } => "RESPONSE_FORMAT_ERROR",
            AppError::Schema { .. } => "SCHEMA_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// The model reply that failed to parse, for the two parsing errors.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            AppError::ResponseFormat { raw, .. } | AppError::Schema { raw, .. } => Some(raw),
            _ => None,
        }
    }

    /// Message shown to the user. Internal errors are not echoed back.
    pub fn user_message(&self) -> String {
        match self {
            AppError::DocumentFormat(msg)
            | AppError::Validation(msg)
            | AppError::RemoteCall(msg)
            | AppError::Configuration(msg) => msg.clone(),
            AppError::PayloadTooLarge { limit } => format!(
                "The upload is larger than the {} limit. Submit a smaller PDF or raise MAX_UPLOAD_BYTES.",
                human_size(*limit)
            ),
            AppError::Timeout(_) => {
                format!("{self}. Submit the request again to retry.")
            }
            AppError::ResponseFormat { message, .. } => {
                format!("The model reply was not valid JSON: {message}")
            }
            AppError::Schema { field, .. } => {
                format!("The model reply is missing or has an invalid '{field}' field")
            }
            AppError::Internal(_) => "An internal server error occurred".to_string(),
        }
    }

    /// Logs server-side failures. Client mistakes are not worth more than debug.
    pub fn log(&self) {
        match self {
            AppError::DocumentFormat(_)
            | AppError::Validation(_)
            | AppError::PayloadTooLarge { .. } => {
                tracing::debug!("Rejected request: {self}");
            }
            AppError::Internal(e) => tracing::error!("Internal error: {e:?}"),
            other => tracing::error!("{other}"),
        }
    }
}

fn human_size(bytes: usize) -> String {
    const MIB: usize = 1024 * 1024;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{} MiB", bytes / MIB)
    } else {
        format!("{bytes} bytes")
    }
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Timeout(after) => AppError::Timeout(after),
            other => AppError::RemoteCall(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();

        let mut error = json!({
            "code": self.code(),
            "message": self.user_message(),
        });
        if let AppError::Schema { field, .. } = &self {
            error["field"] = json!(field);
        }
        if let Some(raw) = self.raw_response() {
            error["raw_response"] = json!(raw);
        }

        (self.status(), Json(json!({ "error": error }))).into_response()
    }
}
