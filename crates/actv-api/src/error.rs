//! # API Error Types
//!
//! Every failure leaves the service as `{"error_code": ..., "message": ...}`.
//! Server-side failures carry a generic message; the detail goes to the log.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use actv_issuance::{ErrorCode, RedemptionError};

/// JSON error response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable code, e.g. `CODE_USED`.
    pub error_code: String,
    /// Human-readable message.
    pub message: String,
}

/// Application-level error type that implements [`IntoResponse`].
#[derive(Error, Debug)]
pub enum AppError {
    /// Redemption was refused or failed.
    #[error(transparent)]
    Redemption(#[from] RedemptionError),

    /// The body is not a JSON object of the expected shape (400).
    #[error("invalid request body: {0}")]
    BadRequest(String),

    /// Missing or wrong admin token (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),
}

impl AppError {
    /// HTTP status and wire error code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Redemption(err) => {
                let code = err.code();
                let status = match code {
                    ErrorCode::InvalidRequest
                    | ErrorCode::InvalidAppId
                    | ErrorCode::CodeUsed
                    | ErrorCode::CodeExpired => StatusCode::BAD_REQUEST,
                    ErrorCode::CodeNotFound => StatusCode::NOT_FOUND,
                    ErrorCode::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, code.as_str())
            }
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, ErrorCode::InvalidRequest.as_str()),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
        }
    }

    /// Message safe to show the caller.
    pub fn public_message(&self) -> String {
        match self {
            Self::Redemption(err) => err.public_message(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        if status.is_server_error() {
            let retryable = matches!(&self, Self::Redemption(e) if e.is_retryable());
            tracing::error!(error = %self, error_code = code, retryable, "request failed");
        }

        let body = ErrorBody {
            error_code: code.to_string(),
            message: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}
