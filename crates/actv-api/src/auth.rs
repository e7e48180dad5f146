//! # Admin Token Middleware
//!
//! Guards the operator endpoints with a static bearer token from
//! `ADMIN_TOKEN`. When no token is configured the guard is open.
//!
//! ```text
//! Authorization: Bearer {ADMIN_TOKEN}
//! ```

use axum::extract::Request;
use axum::http::header;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use subtle::ConstantTimeEq;

use crate::error::AppError;

/// Admin token injected into request extensions.
///
/// Custom `Debug` redacts the token value.
#[derive(Clone, Default)]
pub struct AdminAuth {
    pub token: Option<String>,
}

impl AdminAuth {
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }
}

impl std::fmt::Debug for AdminAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminAuth")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Constant-time comparison of bearer tokens.
///
/// When lengths differ a dummy comparison still runs, so timing does not
/// depend on where the inputs diverge.
pub fn constant_time_token_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

/// Check the `Authorization` header against the configured admin token.
pub async fn admin_middleware(request: Request, next: Next) -> Response {
    let expected = request
        .extensions()
        .get::<AdminAuth>()
        .and_then(|auth| auth.token.clone());

    let Some(expected) = expected else {
        return next.run(request).await;
    };

    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match header_value.and_then(|v| v.strip_prefix("Bearer ")) {
        Some(provided) if constant_time_token_eq(provided, &expected) => next.run(request).await,
        Some(_) => {
            tracing::warn!("admin authentication failed: invalid bearer token");
            unauthorized_response("invalid bearer token")
        }
        None if header_value.is_some() => {
            tracing::warn!("admin authentication failed: non-Bearer authorization scheme");
            unauthorized_response("authorization header must use Bearer scheme")
        }
        None => {
            tracing::warn!("admin authentication failed: missing authorization header");
            unauthorized_response("missing authorization header")
        }
    }
}

fn unauthorized_response(message: &str) -> Response {
    AppError::Unauthorized(message.to_string()).into_response()
}
