//! # Activation API
//!
//! `POST /api/activate` redeems an activation code for a signed license.
//! Success returns the license JSON exactly as the client must verify it;
//! failure returns `{"error_code", "message"}`.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};

use actv_core::Timestamp;
use actv_issuance::RedeemRequest;
use actv_state::License;

use crate::error::AppError;
use crate::extractors::extract_json;
use crate::state::AppState;

/// Build the activation router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/activate", post(activate))
}

/// POST /api/activate: Redeem a code.
async fn activate(
    State(state): State<AppState>,
    body: Result<Json<RedeemRequest>, JsonRejection>,
) -> Result<Json<License>, AppError> {
    let request = extract_json(body)?;
    let license = state.service.redeem(&request, Timestamp::now()).await?;
    Ok(Json(license))
}
