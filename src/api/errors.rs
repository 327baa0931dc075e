//! Gateway error types and their HTTP-style responses

use super::event::GatewayResponse;
use crate::storage::StorageError;
use axum::http::StatusCode;
use thiserror::Error;

/// Errors that end a gateway invocation.
///
/// The `String` payloads explain the failure in logs; clients only ever see
/// the fixed [`GatewayError::message`].
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    /// Storage client fault. Not turned into a response by the handler; it
    /// propagates to the host (Lambda invocation error, 500 in serve mode).
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl GatewayError {
    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::Forbidden(_) => StatusCode::FORBIDDEN,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message placed in the `message` body field
    pub fn message(&self) -> &'static str {
        match self {
            GatewayError::BadRequest(_) => "Bad request",
            GatewayError::Forbidden(_) => "Forbidden",
            GatewayError::NotFound(_) => "Not found",
            GatewayError::InternalError(_) | GatewayError::Storage(_) => "Internal Error",
        }
    }

    /// Render as a `{"message": ...}` response with no extra headers.
    pub fn into_response(self) -> GatewayResponse {
        GatewayResponse::message(self.status_code(), self.message())
    }
}
