//! Error handling for the HTTP layer

use axum::{
    body::Body,
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use uuid::Uuid;

/// A single rejected input field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Standard error response format for all HTTP errors
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub timestamp: String,
    pub status: u16,
    pub error: String,
    pub message: String,
    pub path: String,
    pub trace_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<Vec<FieldError>>,
}

/// Application error types that map to HTTP responses
#[derive(Error, Debug)]
pub enum AppError {
    #[error("validation error: {message}")]
    Validation {
        field_errors: Vec<FieldError>,
        message: String,
    },

    #[error("conflict: {message}")]
    Conflict { message: String },

    #[error("not found: {message}")]
    NotFound { message: String },

    #[error("bad request: {message}")]
    BadRequest { message: String },

    #[error("request timed out")]
    Timeout,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Create a validation error
    pub fn validation(field_errors: Vec<FieldError>, message: impl Into<String>) -> Self {
        Self::Validation {
            field_errors,
            message: message.into(),
        }
    }

    /// Create a conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } | AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Timeout => StatusCode::REQUEST_TIMEOUT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short machine-readable code used in logs
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "validation_error",
            AppError::Conflict { .. } => "conflict",
            AppError::NotFound { .. } => "not_found",
            AppError::BadRequest { .. } => "bad_request",
            AppError::Timeout => "timeout",
            AppError::Internal(_) => "internal_error",
        }
    }

    /// Translate the error into the uniform body. `path` is filled in later by
    /// [`attach_request_path`].
    pub fn to_body(&self) -> ErrorBody {
        let status = self.status();
        let timestamp = OffsetDateTime::now_utc();

        let (message, field_errors) = match self {
            AppError::Validation {
                field_errors,
                message,
            } => (message.clone(), Some(field_errors.clone())),
            AppError::Conflict { message }
            | AppError::NotFound { message }
            | AppError::BadRequest { message } => (message.clone(), None),
            AppError::Timeout => (self.to_string(), None),
            // Internal details stay in the logs for release builds
            AppError::Internal(e) => {
                if cfg!(debug_assertions) {
                    (e.to_string(), None)
                } else {
                    ("An internal server error occurred".to_string(), None)
                }
            }
        };

        ErrorBody {
            timestamp: timestamp
                .format(&Rfc3339)
                .unwrap_or_else(|_| timestamp.to_string()),
            status: status.as_u16(),
            error: status.canonical_reason().unwrap_or("Unknown").to_string(),
            message,
            path: String::new(),
            trace_id: Uuid::now_v7().to_string(),
            field_errors,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = self.to_body();
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(
                error_id = %body.trace_id,
                error_code = self.code(),
                status_code = %status.as_u16(),
                error = %self,
                "Request error"
            );
        } else {
            tracing::warn!(
                error_id = %body.trace_id,
                error_code = self.code(),
                status_code = %status.as_u16(),
                message = %body.message,
                "Request error"
            );
        }

        let mut response = (status, Json(body.clone())).into_response();
        response.extensions_mut().insert(body);
        response
    }
}

/// Middleware that stamps the request path into every [`ErrorBody`] produced downstream.
pub async fn attach_request_path(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let mut response = next.run(request).await;

    let Some(mut body) = response.extensions_mut().remove::<ErrorBody>() else {
        return response;
    };
    body.path = path;

    match serde_json::to_vec(&body) {
        Ok(bytes) => {
            response.headers_mut().remove(header::CONTENT_LENGTH);
            *response.body_mut() = Body::from(bytes);
            response
        }
        Err(err) => {
            tracing::warn!(error = %err, "failed to re-encode error body");
            response
        }
    }
}
