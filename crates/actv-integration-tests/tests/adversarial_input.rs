//! # Adversarial Requests
//!
//! Hostile or malformed bodies must be refused with `INVALID_REQUEST` (or
//! `INVALID_APP_ID`) before the store is touched, and must never consume a
//! code.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use proptest::prelude::*;
use serde_json::{json, Value};
use tower::ServiceExt;

use actv_api::state::AppState;
use actv_core::{CodeId, Timestamp};
use actv_crypto::LicenseSigner;
use actv_issuance::{AllowedApps, RedeemRequest, RedemptionService};
use actv_state::Plan;
use actv_store::{CodeStore, CountingStore, MemoryCodeStore, NewCode};

async fn counting_app() -> (axum::Router, Arc<CountingStore>) {
    let store = Arc::new(MemoryCodeStore::new());
    store
        .seed(&[NewCode {
            code: CodeId::new("ACT-target").unwrap(),
            plan: Plan::Lifetime,
            expires_at: Timestamp::parse("2099-12-31T23:59:59Z").unwrap(),
        }])
        .await
        .unwrap();
    let counting = Arc::new(CountingStore::new(store));
    let service = RedemptionService::new(
        counting.clone(),
        Some(Arc::new(LicenseSigner::generate())),
        AllowedApps::default(),
    );
    (actv_api::app(AppState::new(service)), counting)
}

fn post(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/activate")
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

async fn error_code(response: axum::http::Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    body["error_code"].as_str().unwrap().to_string()
}

fn valid() -> Value {
    json!({
        "code": "ACT-target",
        "device_hash": "SHA256:abc",
        "app_id": "moments_ai",
        "app_version": "1.0.0"
    })
}

#[tokio::test]
async fn rejected_bodies_never_reach_the_store() {
    let mut cases: Vec<(Value, &str)> = Vec::new();

    let mut v = valid();
    v["code"] = json!("");
    cases.push((v, "INVALID_REQUEST"));

    let mut v = valid();
    v["code"] = json!("ACT-\u{0000}target");
    cases.push((v, "INVALID_REQUEST"));

    let mut v = valid();
    v["device_hash"] = json!("x".repeat(10_000));
    cases.push((v, "INVALID_REQUEST"));

    let mut v = valid();
    v["device_hash"] = json!(["SHA256:abc"]);
    cases.push((v, "INVALID_REQUEST"));

    let mut v = valid();
    v["app_version"] = Value::Null;
    cases.push((v, "INVALID_REQUEST"));

    let mut v = valid();
    v["app_id"] = json!("MOMENTS_AI");
    cases.push((v, "INVALID_APP_ID"));

    cases.push((json!([valid()]), "INVALID_REQUEST"));
    cases.push((json!("ACT-target"), "INVALID_REQUEST"));

    for (body, expected) in cases {
        let (app, counting) = counting_app().await;
        let response = app.oneshot(post(body.to_string())).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(error_code(response).await, expected, "{body}");
        assert_eq!(counting.accesses(), 0, "{body}");
    }
}

#[tokio::test]
async fn non_json_content_type_is_invalid_request() {
    let (app, counting) = counting_app().await;
    let request = Request::builder()
        .method("POST")
        .uri("/api/activate")
        .header("content-type", "text/plain")
        .body(Body::from(valid().to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(response).await, "INVALID_REQUEST");
    assert_eq!(counting.accesses(), 0);
}

#[tokio::test]
async fn extra_fields_are_ignored() {
    let (app, _) = counting_app().await;
    let mut body = valid();
    body["plan"] = json!("lifetime");
    body["signature"] = json!("ed25519:forged");
    let response = app.oneshot(post(body.to_string())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Arbitrary text in any field either validates or is refused as a
    /// client error; validation never panics.
    #[test]
    fn validation_is_total(
        code in "\\PC{0,200}",
        device in "\\PC{0,300}",
        app in "\\PC{0,80}",
        version in "\\PC{0,80}",
    ) {
        let request = RedeemRequest {
            code: Some(code),
            device_hash: Some(device),
            app_id: Some(app),
            app_version: Some(version),
        };
        if let Err(e) = request.validate(&AllowedApps::default()) {
            let code = e.code().as_str();
            prop_assert!(code == "INVALID_REQUEST" || code == "INVALID_APP_ID");
        }
    }
}
