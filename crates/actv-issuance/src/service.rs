//! The redemption orchestrator.

use std::sync::Arc;

use actv_core::Timestamp;
use actv_crypto::{LicensePublicKey, LicenseSigner};
use actv_state::{License, Redemption};
use actv_store::{CodeStore, ReserveOutcome};

use crate::error::RedemptionError;
use crate::issuer::LicenseIssuer;
use crate::request::{AllowedApps, RedeemRequest};

/// Redeems activation codes for signed licenses.
///
/// Cheap to clone; the store and signer are shared.
#[derive(Clone)]
pub struct RedemptionService {
    store: Arc<dyn CodeStore>,
    signer: Option<Arc<LicenseSigner>>,
    allowed_apps: AllowedApps,
    issuer: LicenseIssuer,
}

impl std::fmt::Debug for RedemptionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedemptionService")
            .field("store", &self.store.backend_name())
            .field("signer", &self.signer.as_ref().map(|s| s.public_key()))
            .field("allowed_apps", &self.allowed_apps)
            .finish()
    }
}

impl RedemptionService {
    /// Create a service. A `None` signer is allowed so the process can start
    /// and report health, but every redemption then fails with
    /// `SERVER_ERROR` before touching the store.
    pub fn new(
        store: Arc<dyn CodeStore>,
        signer: Option<Arc<LicenseSigner>>,
        allowed_apps: AllowedApps,
    ) -> Self {
        Self {
            store,
            signer,
            allowed_apps,
            issuer: LicenseIssuer::new(),
        }
    }

    /// The underlying code store.
    pub fn store(&self) -> &Arc<dyn CodeStore> {
        &self.store
    }

    /// Whether a signing key is configured.
    pub fn has_signer(&self) -> bool {
        self.signer.is_some()
    }

    /// Public key matching the configured signing key.
    pub fn public_key(&self) -> Option<LicensePublicKey> {
        self.signer.as_ref().map(|s| s.public_key())
    }

    /// Redeem the code named in `request` at time `now`.
    pub async fn redeem(
        &self,
        request: &RedeemRequest,
        now: Timestamp,
    ) -> Result<License, RedemptionError> {
        let request = request.validate(&self.allowed_apps).map_err(|e| {
            tracing::info!(error_code = %e.code(), reason = %e, "redemption request rejected");
            e
        })?;

        let Some(signer) = self.signer.as_ref() else {
            tracing::error!("LICENSE_PRIVATE_KEY is not configured; refusing to redeem");
            return Err(RedemptionError::SigningKeyMissing);
        };

        let code = self
            .store
            .lookup(&request.code)
            .await?
            .ok_or(RedemptionError::CodeNotFound)
            .map_err(|e| {
                tracing::info!(code = %request.code, "unknown activation code");
                e
            })?;

        if code.is_expired_at(&now) {
            tracing::info!(code = %request.code, expires_at = %code.expires_at, "expired activation code");
            return Err(RedemptionError::CodeExpired {
                expires_at: code.expires_at,
            });
        }

        let serial = self.store.next_license_serial().await?;
        let license_id = self.issuer.license_id(&now, serial);
        let redemption = Redemption {
            device_hash: request.device_hash.clone(),
            license_id: license_id.clone(),
            used_at: now,
        };

        let reserved = match self.store.reserve(&request.code, redemption).await? {
            ReserveOutcome::Reserved(record) => record,
            ReserveOutcome::AlreadyUsed => {
                tracing::info!(code = %request.code, "activation code already used");
                return Err(RedemptionError::CodeUsed);
            }
            ReserveOutcome::NotFound => return Err(RedemptionError::CodeNotFound),
        };

        // The code is consumed from here on. No path below may re-reserve.
        let license = self.issuer.build(&reserved, &request, license_id, now);
        let payload = license.canonical_payload().map_err(|source| {
            tracing::error!(
                code = %request.code,
                license_id = %license.license_id,
                error = %source,
                "code reserved but license encoding failed; manual remediation required"
            );
            RedemptionError::IssuanceFailed {
                code: request.code.clone(),
                source,
            }
        })?;
        let signature = signer.sign_tagged(&payload);
        let license = license.with_signature(signature);

        tracing::info!(
            code = %request.code,
            app_id = %request.app_id,
            app_version = %request.app_version,
            license_id = %license.license_id,
            plan = %license.plan,
            device = %request.device_hash.log_prefix(),
            "license issued"
        );
        Ok(license)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actv_core::CodeId;
    use actv_crypto::TaggedSignature;
    use actv_state::Plan;
    use actv_store::{CountingStore, MemoryCodeStore, NewCode};

    fn now() -> Timestamp {
        Timestamp::parse("2026-02-09T12:00:00Z").unwrap()
    }

    async fn store_with(codes: &[(&str, Plan, &str)]) -> Arc<MemoryCodeStore> {
        let store = Arc::new(MemoryCodeStore::new());
        let entries: Vec<NewCode> = codes
            .iter()
            .map(|(c, p, e)| NewCode {
                code: CodeId::new(*c).unwrap(),
                plan: *p,
                expires_at: Timestamp::parse(e).unwrap(),
            })
            .collect();
        store.seed(&entries).await.unwrap();
        store
    }

    fn request(code: &str, device: &str) -> RedeemRequest {
        RedeemRequest {
            code: Some(code.into()),
            device_hash: Some(device.into()),
            app_id: Some("moments_ai".into()),
            app_version: Some("1.0.0".into()),
        }
    }

    fn service(store: Arc<dyn CodeStore>, signer: Option<LicenseSigner>) -> RedemptionService {
        RedemptionService::new(store, signer.map(Arc::new), AllowedApps::default())
    }

    #[tokio::test]
    async fn redeem_signs_after_reserving() {
        let store = store_with(&[("ACT-1", Plan::Lifetime, "2099-12-31T23:59:59Z")]).await;
        let signer = LicenseSigner::generate();
        let public = signer.public_key();
        let svc = service(store.clone(), Some(signer));

        let license = svc.redeem(&request("ACT-1", "SHA256:abc"), now()).await.unwrap();
        assert_eq!(license.plan, Plan::Lifetime);
        assert_eq!(license.device_hash.as_str(), "SHA256:abc");
        assert_eq!(license.license_id.as_str(), "LIC-20260209-000001");

        let tagged = TaggedSignature::parse(license.signature.as_deref().unwrap()).unwrap();
        public
            .verify(&license.canonical_payload().unwrap(), tagged.signature())
            .unwrap();

        let stored = store.lookup(&CodeId::new("ACT-1").unwrap()).await.unwrap().unwrap();
        assert_eq!(stored.redemption().unwrap().license_id, license.license_id);
    }

    #[tokio::test]
    async fn second_redemption_is_code_used() {
        let store = store_with(&[("ACT-1", Plan::Lifetime, "2099-12-31T23:59:59Z")]).await;
        let svc = service(store, Some(LicenseSigner::generate()));
        svc.redeem(&request("ACT-1", "SHA256:abc"), now()).await.unwrap();
        let err = svc.redeem(&request("ACT-1", "SHA256:abc"), now()).await.unwrap_err();
        assert!(matches!(err, RedemptionError::CodeUsed));
    }

    #[tokio::test]
    async fn missing_signer_fails_without_store_access() {
        let store = store_with(&[("ACT-1", Plan::Lifetime, "2099-12-31T23:59:59Z")]).await;
        let counting = Arc::new(CountingStore::new(store.clone()));
        let svc = service(counting.clone(), None);

        let err = svc.redeem(&request("ACT-1", "SHA256:abc"), now()).await.unwrap_err();
        assert!(matches!(err, RedemptionError::SigningKeyMissing));
        assert_eq!(counting.accesses(), 0);
        let record = store.lookup(&CodeId::new("ACT-1").unwrap()).await.unwrap().unwrap();
        assert!(!record.is_used());
    }

    #[tokio::test]
    async fn expired_unused_code_is_never_reserved() {
        let store = store_with(&[("ACT-old", Plan::Trial, "2026-02-09T12:00:00Z")]).await;
        let counting = Arc::new(CountingStore::new(store.clone()));
        let svc = service(counting.clone(), Some(LicenseSigner::generate()));

        let err = svc.redeem(&request("ACT-old", "SHA256:abc"), now()).await.unwrap_err();
        assert!(matches!(err, RedemptionError::CodeExpired { .. }));
        assert_eq!(counting.reserves(), 0);
    }
}
