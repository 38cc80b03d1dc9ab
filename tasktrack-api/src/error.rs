/// Error handling for the API server
///
/// This module provides a unified error type that renders as the response
/// envelope. All handlers return `Result<T, ApiError>`; the error converts
/// into an envelope whose `statusCode` mirrors the transport status and whose
/// `error` field carries a machine-readable SCREAMING_SNAKE code.
///
/// Store errors cross a single translation boundary:
/// `tasktrack_shared::db::classify` turns a driver error into a
/// [`DbErrorKind`](tasktrack_shared::db::DbErrorKind), and each route maps
/// the kinds it cares about to its own codes (a unique violation means
/// `EMAIL_ALREADY_EXISTS` on the users route but is unexpected elsewhere).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;
use tasktrack_shared::db::DbErrorKind;

use crate::response::Envelope;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error
///
/// Carries everything the envelope needs: transport status, symbolic code,
/// human-readable message and the route path.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
    pub path: String,
}

impl ApiError {
    fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.to_string(),
            message: message.into(),
            path: String::new(),
        }
    }

    /// Bad request (400)
    pub fn bad_request(code: &str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    /// Not found (404)
    pub fn not_found(code: &str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, code, message)
    }

    /// Conflict (409)
    pub fn conflict(code: &str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, code, message)
    }

    /// Internal server error (500)
    ///
    /// The message is logged but a generic one is sent to the client.
    pub fn internal(code: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        tracing::error!(error_code = code, "internal error: {message}");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            code,
            "An internal error occurred",
        )
    }

    /// Internal error for a store failure no route-level mapping claimed
    ///
    /// The raw SQLSTATE (when known) becomes the error code, matching how
    /// unhandled driver errors are surfaced everywhere.
    pub fn internal_db(kind: &DbErrorKind) -> Self {
        let code = kind
            .raw_code()
            .unwrap_or("INTERNAL_SERVER_ERROR")
            .to_string();
        tracing::error!(error_code = %code, "unhandled store error: {kind}");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            &code,
            "An internal error occurred",
        )
    }

    /// Bad request carrying the first message from request validation
    pub fn validation(errors: &validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| match &e.message {
                    Some(msg) => format!("{field}: {msg}"),
                    None => format!("{field}: invalid value"),
                })
            })
            .next()
            .unwrap_or_else(|| "Request validation failed".to_string());

        Self::bad_request("VALIDATION_ERROR", message)
    }

    /// Attaches the route path the error will be reported under
    pub fn at(mut self, path: &str) -> Self {
        self.path = path.to_string();
        self
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.status, self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let envelope: Envelope<()> = Envelope {
            status_code: self.status.as_u16(),
            message: self.message,
            data: None,
            error: Some(self.code),
            timestamp: chrono::Utc::now(),
            path: self.path,
        };

        envelope.into_response()
    }
}
