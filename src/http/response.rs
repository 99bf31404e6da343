//! JSON response envelope.
//!
//! # Responsibilities
//! - Wrap every API payload in the same `{success, data, message, ...}` shape
//! - Map failures to status codes and error envelopes
//! - Hide internal error details in production
//!
//! # Envelope
//! ```text
//! { "success": true,  "data": ..., "message": "...", "timestamp": "...", "path": "/x" }
//! { "success": false, "message": "...", "error": "...", "statusCode": 404, "timestamp": "...", "path": "/x" }
//! ```

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::time::Duration;

use crate::config::schema::Environment;
use crate::db::error::DatabaseError;
use crate::resilience::classify::FailureKind;
use crate::resilience::retries::ExecutorError;

/// Current time in RFC 3339 with millisecond precision.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Standard response envelope.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            error: None,
            status_code: None,
            pagination: None,
            timestamp: timestamp(),
            path: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn at(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Render with the given status code.
    pub fn respond(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

/// Page metadata for list responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u64,
    pub total_pages: u64,
    pub total_items: u64,
    pub items_per_page: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    /// Compute page metadata. Pages are 1-based.
    pub fn new(current_page: u64, items_per_page: u64, total_items: u64) -> Self {
        let total_pages = if items_per_page == 0 {
            0
        } else {
            total_items.div_ceil(items_per_page)
        };
        Self {
            current_page,
            total_pages,
            total_items,
            items_per_page,
            has_next: current_page < total_pages,
            has_prev: current_page > 1,
        }
    }
}

/// 200 with the success envelope.
pub fn success<T: Serialize>(path: &str, data: T, message: Option<&str>) -> Response {
    let mut body = ApiResponse::ok(data).at(path);
    body.message = message.map(str::to_string);
    body.respond(StatusCode::OK)
}

/// 201 with the success envelope.
pub fn created<T: Serialize>(path: &str, data: T, message: Option<&str>) -> Response {
    let mut body = ApiResponse::ok(data).at(path);
    body.message = message.map(str::to_string);
    body.respond(StatusCode::CREATED)
}

pub fn no_content() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

/// 200 with a page of items and its metadata.
pub fn paginated<T: Serialize>(
    path: &str,
    items: Vec<T>,
    pagination: Pagination,
    message: Option<&str>,
) -> Response {
    let mut body = ApiResponse::ok(items).at(path);
    body.pagination = Some(pagination);
    body.message = message.map(str::to_string);
    body.respond(StatusCode::OK)
}

/// Error rendered as the failure envelope.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub detail: Option<String>,
    pub errors: Option<serde_json::Value>,
    pub path: Option<String>,
    pub retry_after: Option<Duration>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            detail: None,
            errors: None,
            path: None,
            retry_after: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    /// 400 carrying field-level validation errors under `data.errors`.
    pub fn validation(message: impl Into<String>, errors: Option<serde_json::Value>) -> Self {
        let mut err = Self::new(StatusCode::BAD_REQUEST, message).with_detail("Validation Error");
        err.errors = errors;
        err
    }

    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::new(StatusCode::TOO_MANY_REQUESTS, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn at(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn retry_after(mut self, after: Duration) -> Self {
        self.retry_after = Some(after);
        self
    }

    /// Map a failed database operation to a client-facing error.
    pub fn from_database(err: &ExecutorError<DatabaseError>, environment: Environment) -> Self {
        match err.kind() {
            Some(FailureKind::Validation) | Some(FailureKind::Cast) => {
                Self::bad_request("Validation Error").with_detail(err.to_string())
            }
            Some(FailureKind::DuplicateKey) => {
                Self::conflict("Duplicate data error").with_detail(err.to_string())
            }
            Some(FailureKind::NotFound) => Self::not_found("Resource not found"),
            Some(FailureKind::Auth) => Self::unauthorized("Unauthorized"),
            _ if matches!(err, ExecutorError::ReadinessTimeout(_)) || err.kind() == Some(FailureKind::Timeout) => {
                Self::service_unavailable("Database unavailable")
            }
            _ if environment.is_production() => Self::internal("Internal server error"),
            _ => Self::internal(err.to_string()),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.status.as_u16(), self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiResponse {
            success: false,
            data: self.errors.map(|errors| serde_json::json!({ "errors": errors })),
            message: Some(self.message),
            error: self.detail,
            status_code: Some(self.status.as_u16()),
            pagination: None,
            timestamp: timestamp(),
            path: self.path,
        };

        let mut response = body.respond(self.status);
        if let Some(after) = self.retry_after {
            let secs = after.as_secs().max(1);
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}
