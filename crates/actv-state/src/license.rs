//! # License Value Record
//!
//! A `License` is built once, immediately after a successful reservation,
//! then canonically encoded, signed and returned. It is never persisted or
//! mutated; attaching the signature consumes the unsigned value.
//!
//! The signed payload is the canonical encoding of every field except
//! `signature`. The offline verifier removes `signature` from the JSON it
//! receives and re-derives the same bytes, so every field serialized here is
//! covered by the signature.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use actv_core::{AppId, CanonicalBytes, CanonicalizationError, DeviceHash, LicenseId, Timestamp};

use crate::code::Plan;

/// Schema version written into every license.
pub const LICENSE_SCHEMA_VERSION: u32 = 1;

/// Name of the field that carries the tagged signature.
pub const SIGNATURE_FIELD: &str = "signature";

/// Named feature switches granted by the license.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFlags {
    /// Interactive moments.
    pub moments_interact: bool,
    /// AI settings panel.
    pub ai_settings: bool,
}

impl FeatureFlags {
    /// Every feature on. Issued licenses currently grant the full set.
    pub fn all_enabled() -> Self {
        Self {
            moments_interact: true,
            ai_settings: true,
        }
    }
}

/// A license record, unsigned until [`License::with_signature`] is called.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    pub schema_version: u32,
    pub license_id: LicenseId,
    pub app_id: AppId,
    pub plan: Plan,
    pub device_hash: DeviceHash,
    pub issued_at: Timestamp,
    pub expires_at: Timestamp,
    pub features: FeatureFlags,
    /// Per-issuance random marker. Not an access-control token.
    pub nonce: String,
    /// `ed25519:<base64>` once signed.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub signature: Option<String>,
}

impl License {
    /// Canonical bytes of the license with `signature` excluded.
    pub fn canonical_payload(&self) -> Result<CanonicalBytes, CanonicalizationError> {
        let value = serde_json::to_value(self)?;
        let (payload, _) = detach_signature(value)?;
        Ok(payload)
    }

    /// Attach the tagged signature, producing the final record.
    pub fn with_signature(self, signature: impl std::fmt::Display) -> Self {
        Self {
            signature: Some(signature.to_string()),
            ..self
        }
    }

    /// Whether a signature has been attached.
    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }
}

/// Split a received license JSON into its signed payload and signature.
///
/// This is the verifier-side derivation: drop `signature` from the top-level
/// object and canonically encode everything else, including fields this
/// crate does not know about.
pub fn detach_signature(
    mut value: Value,
) -> Result<(CanonicalBytes, Option<String>), CanonicalizationError> {
    let signature = match value.as_object_mut().and_then(|m| m.remove(SIGNATURE_FIELD)) {
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
        None => None,
    };
    Ok((CanonicalBytes::from_value(value)?, signature))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn license() -> License {
        License {
            schema_version: LICENSE_SCHEMA_VERSION,
            license_id: LicenseId::new("LIC-20260209-4511").unwrap(),
            app_id: AppId::new("moments_ai").unwrap(),
            plan: Plan::Lifetime,
            device_hash: DeviceHash::new("SHA256:abc").unwrap(),
            issued_at: Timestamp::parse("2026-02-09T11:59:51Z").unwrap(),
            expires_at: Timestamp::parse("2099-12-31T23:59:59Z").unwrap(),
            features: FeatureFlags::all_enabled(),
            nonce: "65j1ebfko0g".into(),
            signature: None,
        }
    }

    #[test]
    fn canonical_payload_sorted_compact() {
        let payload = license().canonical_payload().unwrap();
        assert_eq!(
            payload.as_str(),
            concat!(
                r#"{"app_id":"moments_ai","device_hash":"SHA256:abc","#,
                r#""expires_at":"2099-12-31T23:59:59Z","#,
                r#""features":{"ai_settings":true,"moments_interact":true},"#,
                r#""issued_at":"2026-02-09T11:59:51Z","license_id":"LIC-20260209-4511","#,
                r#""nonce":"65j1ebfko0g","plan":"lifetime","schema_version":1}"#
            )
        );
    }

    #[test]
    fn payload_excludes_signature() {
        let unsigned = license();
        let signed = unsigned.clone().with_signature("ed25519:AAAA");
        assert!(signed.is_signed());
        assert_eq!(
            unsigned.canonical_payload().unwrap(),
            signed.canonical_payload().unwrap()
        );
    }

    #[test]
    fn unsigned_license_omits_signature_field() {
        let json = serde_json::to_value(license()).unwrap();
        assert!(json.get("signature").is_none());
    }

    #[test]
    fn detach_signature_keeps_unknown_fields() {
        let mut json = serde_json::to_value(license().with_signature("ed25519:xyz")).unwrap();
        json["extra"] = serde_json::json!("field");
        let (payload, sig) = detach_signature(json).unwrap();
        assert_eq!(sig.as_deref(), Some("ed25519:xyz"));
        assert!(payload.as_str().contains(r#""extra":"field""#));
        assert!(!payload.as_str().contains("signature"));
    }
}
