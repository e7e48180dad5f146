//! # Body Extraction
//!
//! Handlers take `Result<Json<T>, JsonRejection>` so a malformed body
//! becomes an `INVALID_REQUEST` error body instead of axum's plain-text
//! rejection.

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::error::AppError;

/// Extract a JSON body, mapping every rejection to [`AppError::BadRequest`].
///
/// ```ignore
/// async fn handler(body: Result<Json<T>, JsonRejection>) -> Result<..., AppError> {
///     let req = extract_json(body)?;
/// }
/// ```
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}
