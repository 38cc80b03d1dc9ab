/// Uniform response envelope
///
/// Every endpoint (except the health probe) wraps its payload in the same
/// envelope so clients can treat success and failure uniformly:
///
/// ```json
/// {
///   "statusCode": 200,
///   "message": "Success",
///   "data": { ... },
///   "timestamp": "2025-07-02T12:00:00Z",
///   "path": "/users"
/// }
/// ```
///
/// `statusCode` always mirrors the transport status. Error responses carry an
/// `error` field with a machine-readable SCREAMING_SNAKE code instead of
/// `data`; see [`crate::error::ApiError`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Response envelope shared by all API endpoints
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T: Serialize> {
    /// Mirrors the HTTP transport status
    pub status_code: u16,

    /// Human-readable summary
    pub message: String,

    /// Payload, present on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    /// Machine-readable error code, present on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// When the response was produced
    pub timestamp: DateTime<Utc>,

    /// Route that produced the response
    pub path: String,
}

impl<T: Serialize> Envelope<T> {
    /// 200 envelope with a payload
    pub fn ok(path: &str, message: &str, data: T) -> Self {
        Self::with_status(StatusCode::OK, path, message, data)
    }

    /// 201 envelope with a payload
    pub fn created(path: &str, message: &str, data: T) -> Self {
        Self::with_status(StatusCode::CREATED, path, message, data)
    }

    /// Success envelope with an explicit status
    pub fn with_status(status: StatusCode, path: &str, message: &str, data: T) -> Self {
        Self {
            status_code: status.as_u16(),
            message: message.to_string(),
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
            path: path.to_string(),
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}
