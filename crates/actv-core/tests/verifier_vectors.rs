//! # Verifier Byte-Compatibility Vectors
//!
//! The offline verifier in client software re-derives the signed bytes with
//! `json.dumps(license, sort_keys=True, separators=(",", ":"), ensure_ascii=False)`
//! after removing `signature`. These vectors pin `CanonicalBytes` to that
//! exact output.

use actv_core::CanonicalBytes;
use serde_json::json;

const CLIENT_EXPECTED: &str = concat!(
    r#"{"app_id":"moments_ai","#,
    r#""device_hash":"SHA256:a4c1bf40a60835318b399d6bfa882e93465a9457ab1be8598820a11156acc154","#,
    r#""expires_at":"2099-12-31T23:59:59Z","#,
    r#""features":{"ai_settings":true,"moments_interact":true},"#,
    r#""issued_at":"2026-02-09T11:59:51.955Z","#,
    r#""license_id":"LIC-20260209-4511","#,
    r#""nonce":"65j1ebfko0g","#,
    r#""plan":"lifetime","#,
    r#""schema_version":1}"#,
);

#[test]
fn license_payload_matches_client_verifier() {
    let license = json!({
        "schema_version": 1,
        "license_id": "LIC-20260209-4511",
        "app_id": "moments_ai",
        "plan": "lifetime",
        "device_hash": "SHA256:a4c1bf40a60835318b399d6bfa882e93465a9457ab1be8598820a11156acc154",
        "issued_at": "2026-02-09T11:59:51.955Z",
        "expires_at": "2099-12-31T23:59:59Z",
        "features": {
            "moments_interact": true,
            "ai_settings": true
        },
        "nonce": "65j1ebfko0g"
    });

    let cb = CanonicalBytes::new(&license).unwrap();
    assert_eq!(cb.as_str(), CLIENT_EXPECTED);
    assert_eq!(cb.len(), CLIENT_EXPECTED.len());
}

#[test]
fn verifier_side_rederivation_after_removing_signature() {
    let mut received = json!({
        "signature": "ed25519:AAAA",
        "nonce": "65j1ebfko0g",
        "plan": "lifetime",
        "schema_version": 1,
        "features": {"ai_settings": true, "moments_interact": true},
        "app_id": "moments_ai",
        "expires_at": "2099-12-31T23:59:59Z",
        "issued_at": "2026-02-09T11:59:51.955Z",
        "license_id": "LIC-20260209-4511",
        "device_hash": "SHA256:a4c1bf40a60835318b399d6bfa882e93465a9457ab1be8598820a11156acc154"
    });
    received.as_object_mut().unwrap().remove("signature");

    let cb = CanonicalBytes::from_value(received).unwrap();
    assert_eq!(cb.as_str(), CLIENT_EXPECTED);
}

#[test]
fn non_ascii_device_hash_emitted_raw() {
    let cb = CanonicalBytes::new(&json!({"device_hash": "设备-ü"})).unwrap();
    assert_eq!(cb.as_bytes(), "{\"device_hash\":\"设备-ü\"}".as_bytes());
}
