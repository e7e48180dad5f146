//! # actv-api: Activation HTTP Service
//!
//! Exchanges single-use activation codes for Ed25519-signed licenses.
//!
//! ## API Surface
//!
//! | Route | Module | Auth |
//! |---|---|---|
//! | `POST /api/activate` | [`routes::activate`] | none |
//! | `GET /api/health` | [`routes::health`] | `ADMIN_TOKEN` bearer, if set |
//! | `GET /health/liveness` | probe | none |
//! | `GET /health/readiness` | probe | none |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → AdminAuth (health report only) → Handler
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the application router with all routes and middleware.
///
/// Health probes (`/health/*`) carry no credentials and reveal nothing
/// beyond ready / not ready.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::activate::router())
        .merge(routes::health::router())
        .layer(TraceLayer::new_for_http())
        .layer(axum::Extension(state.admin.clone()))
        .with_state(state.clone());

    let probes = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .with_state(state);

    Router::new().merge(probes).merge(api)
}

/// Liveness probe: always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: 200 once the store answers and a signing key is
/// loaded; 503 otherwise.
async fn readiness(State(state): State<AppState>) -> (StatusCode, &'static str) {
    if !state.service.has_signer() {
        return (StatusCode::SERVICE_UNAVAILABLE, "not ready");
    }
    match state.service.store().ping().await {
        Ok(()) => (StatusCode::OK, "ready"),
        Err(e) => {
            tracing::warn!(error = %e, "readiness: code store unreachable");
            (StatusCode::SERVICE_UNAVAILABLE, "not ready")
        }
    }
}
