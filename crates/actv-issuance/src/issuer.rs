//! License construction.

use actv_core::{LicenseId, Timestamp};
use actv_state::{ActivationCode, FeatureFlags, License, LICENSE_SCHEMA_VERSION};

use crate::request::ValidatedRequest;

/// Builds `License` values from a reserved code and the request that
/// reserved it. Has no side effects.
#[derive(Debug, Clone)]
pub struct LicenseIssuer {
    features: FeatureFlags,
}

impl Default for LicenseIssuer {
    fn default() -> Self {
        Self {
            features: FeatureFlags::all_enabled(),
        }
    }
}

impl LicenseIssuer {
    /// Issuer granting every feature.
    pub fn new() -> Self {
        Self::default()
    }

    /// License id for an issuance at `issued_at` with a store-assigned serial.
    pub fn license_id(&self, issued_at: &Timestamp, serial: u64) -> LicenseId {
        LicenseId::issue(issued_at, serial)
    }

    /// Build an unsigned license with a fresh random nonce.
    pub fn build(
        &self,
        code: &ActivationCode,
        request: &ValidatedRequest,
        license_id: LicenseId,
        issued_at: Timestamp,
    ) -> License {
        self.build_with_nonce(code, request, license_id, issued_at, new_nonce())
    }

    /// Build an unsigned license with the given nonce.
    pub fn build_with_nonce(
        &self,
        code: &ActivationCode,
        request: &ValidatedRequest,
        license_id: LicenseId,
        issued_at: Timestamp,
        nonce: String,
    ) -> License {
        License {
            schema_version: LICENSE_SCHEMA_VERSION,
            license_id,
            app_id: request.app_id.clone(),
            plan: code.plan,
            device_hash: request.device_hash.clone(),
            issued_at,
            expires_at: code.expires_at,
            features: self.features,
            nonce,
            signature: None,
        }
    }
}

/// 128 random bits, hex encoded. Marks the issuance; grants nothing.
fn new_nonce() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
