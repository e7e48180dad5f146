//! # Health Report
//!
//! `GET /api/health` tells an operator whether the store is reachable, how
//! many codes remain and whether a signing key is loaded. Read-only: it
//! never reserves or modifies a code. Guarded by `ADMIN_TOKEN` when one is
//! configured.

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use actv_core::Timestamp;
use actv_crypto::LicensePublicKey;
use actv_store::CodeStats;

use crate::auth::admin_middleware;
use crate::state::AppState;

/// Overall service condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Store reachable and signing key loaded.
    Ok,
    /// Running, but redemptions will fail.
    Degraded,
}

/// Code store condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreHealth {
    pub backend: String,
    pub connected: bool,
}

/// Health report body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub timestamp: Timestamp,
    pub version: String,
    pub store: StoreHealth,
    /// Absent when the store could not be read.
    pub codes: Option<CodeStats>,
    pub has_private_key: bool,
    /// Public half of the signing key, for checking client builds.
    pub public_key: Option<LicensePublicKey>,
}

/// Build the health router. The admin guard reads its token from the
/// `AdminAuth` extension installed by [`crate::app`].
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(health))
        .route_layer(from_fn(admin_middleware))
}

/// GET /api/health: Operator health report.
async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let service = &state.service;
    let store = service.store();

    let codes = match store.stats().await {
        Ok(stats) => Some(stats),
        Err(e) => {
            tracing::error!(backend = store.backend_name(), error = %e, "health check: code store unreachable");
            None
        }
    };

    let status = if codes.is_some() && service.has_signer() {
        HealthStatus::Ok
    } else {
        HealthStatus::Degraded
    };

    let report = HealthReport {
        status,
        timestamp: Timestamp::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store: StoreHealth {
            backend: store.backend_name().to_string(),
            connected: codes.is_some(),
        },
        codes,
        has_private_key: service.has_signer(),
        public_key: service.public_key(),
    };

    let code = if report.store.connected {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(report))
}
