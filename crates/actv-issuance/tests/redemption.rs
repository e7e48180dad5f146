//! Redemption protocol tests against real stores and real signatures.

use std::sync::Arc;

use async_trait::async_trait;

use actv_core::{CanonicalBytes, CodeId, Timestamp};
use actv_crypto::{verify, LicenseSigner, TaggedSignature};
use actv_issuance::{AllowedApps, ErrorCode, RedeemRequest, RedemptionError, RedemptionService};
use actv_state::license::detach_signature;
use actv_state::{ActivationCode, Plan, Redemption};
use actv_store::{
    CodeStats, CodeStore, CountingStore, FileCodeStore, MemoryCodeStore, NewCode, ReserveOutcome,
    SeedReport, StoreError,
};

fn now() -> Timestamp {
    Timestamp::parse("2026-02-09T12:00:00Z").unwrap()
}

fn fresh(code: &str, plan: Plan) -> NewCode {
    NewCode {
        code: CodeId::new(code).unwrap(),
        plan,
        expires_at: Timestamp::parse("2099-12-31T23:59:59Z").unwrap(),
    }
}

fn request(code: &str, device: &str) -> RedeemRequest {
    RedeemRequest {
        code: Some(code.into()),
        device_hash: Some(device.into()),
        app_id: Some("moments_ai".into()),
        app_version: Some("2.1.0".into()),
    }
}

async fn seeded(codes: &[NewCode]) -> Arc<MemoryCodeStore> {
    let store = Arc::new(MemoryCodeStore::new());
    store.seed(codes).await.unwrap();
    store
}

fn service(store: Arc<dyn CodeStore>, signer: Arc<LicenseSigner>) -> RedemptionService {
    RedemptionService::new(store, Some(signer), AllowedApps::default())
}

/// Verify the way client software does: from the JSON it receives.
fn verifies_offline(license_json: serde_json::Value, public_key: &[u8]) -> bool {
    let (payload, signature) = detach_signature(license_json).unwrap();
    let Some(signature) = signature else {
        return false;
    };
    let Ok(tagged) = TaggedSignature::parse(&signature) else {
        return false;
    };
    verify(payload.as_bytes(), tagged.signature().as_bytes(), public_key)
}

#[tokio::test]
async fn end_to_end_lifetime_code() {
    let store = seeded(&[fresh("ACT-e2e", Plan::Lifetime)]).await;
    let signer = Arc::new(LicenseSigner::generate());
    let public = signer.public_key();
    let svc = service(store, signer);

    let license = svc.redeem(&request("ACT-e2e", "SHA256:abc"), now()).await.unwrap();
    assert_eq!(license.plan, Plan::Lifetime);
    assert_eq!(license.device_hash.as_str(), "SHA256:abc");
    assert!(license.signature.as_deref().unwrap().starts_with("ed25519:"));

    let json = serde_json::to_value(&license).unwrap();
    assert!(verifies_offline(json, public.as_bytes()));

    let again = svc.redeem(&request("ACT-e2e", "SHA256:abc"), now()).await.unwrap_err();
    assert_eq!(again.code(), ErrorCode::CodeUsed);
}

#[tokio::test]
async fn tampered_license_fails_offline_verification() {
    let store = seeded(&[fresh("ACT-t", Plan::Trial)]).await;
    let signer = Arc::new(LicenseSigner::generate());
    let public = signer.public_key();
    let license = service(store, signer)
        .redeem(&request("ACT-t", "SHA256:abc"), now())
        .await
        .unwrap();

    let mut json = serde_json::to_value(&license).unwrap();
    json["plan"] = serde_json::json!("lifetime");
    assert!(!verifies_offline(json, public.as_bytes()));

    let mut json = serde_json::to_value(&license).unwrap();
    json["device_hash"] = serde_json::json!("SHA256:abd");
    assert!(!verifies_offline(json, public.as_bytes()));
}

#[tokio::test]
async fn signed_bytes_are_field_order_independent() {
    let store = seeded(&[fresh("ACT-o", Plan::Lifetime)]).await;
    let signer = Arc::new(LicenseSigner::generate());
    let public = signer.public_key();
    let license = service(store, signer)
        .redeem(&request("ACT-o", "SHA256:abc"), now())
        .await
        .unwrap();

    // Rebuild the object with keys in reverse order, as a client's JSON
    // library might.
    let json = serde_json::to_value(&license).unwrap();
    let mut entries: Vec<_> = json.as_object().unwrap().clone().into_iter().collect();
    entries.reverse();
    let reordered = serde_json::Value::Object(entries.into_iter().collect());
    assert!(verifies_offline(reordered, public.as_bytes()));

    let direct = license.canonical_payload().unwrap();
    let mut stripped = serde_json::to_value(&license).unwrap();
    stripped.as_object_mut().unwrap().remove("signature");
    assert_eq!(direct, CanonicalBytes::new(&stripped).unwrap());
}

#[tokio::test]
async fn unknown_code_is_not_found() {
    let store = seeded(&[]).await;
    let svc = service(store, Arc::new(LicenseSigner::generate()));
    let err = svc
        .redeem(&request("ACT-doesnotexist", "SHA256:abc"), now())
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::CodeNotFound);
}

#[tokio::test]
async fn expired_codes_rejected_even_if_unused() {
    let store = seeded(&[NewCode {
        code: CodeId::new("ACT-exp").unwrap(),
        plan: Plan::Trial,
        expires_at: Timestamp::parse("2026-01-01T00:00:00Z").unwrap(),
    }])
    .await;
    let svc = service(store.clone(), Arc::new(LicenseSigner::generate()));

    let err = svc.redeem(&request("ACT-exp", "SHA256:abc"), now()).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::CodeExpired);

    let record = store.lookup(&CodeId::new("ACT-exp").unwrap()).await.unwrap().unwrap();
    assert!(!record.is_used());
}

#[tokio::test]
async fn expired_used_code_reports_expired() {
    let store = seeded(&[NewCode {
        code: CodeId::new("ACT-both").unwrap(),
        plan: Plan::Trial,
        expires_at: Timestamp::parse("2026-02-01T00:00:00Z").unwrap(),
    }])
    .await;
    let svc = service(store, Arc::new(LicenseSigner::generate()));
    let earlier = Timestamp::parse("2026-01-15T00:00:00Z").unwrap();
    svc.redeem(&request("ACT-both", "SHA256:abc"), earlier).await.unwrap();

    let err = svc.redeem(&request("ACT-both", "SHA256:abc"), now()).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::CodeExpired);
}

#[tokio::test]
async fn missing_device_hash_touches_no_store() {
    let store = seeded(&[fresh("ACT-x", Plan::Lifetime)]).await;
    let counting = Arc::new(CountingStore::new(store));
    let svc = service(counting.clone(), Arc::new(LicenseSigner::generate()));

    let mut req = request("ACT-x", "SHA256:abc");
    req.device_hash = None;
    let err = svc.redeem(&req, now()).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(counting.accesses(), 0);
}

#[tokio::test]
async fn disallowed_app_touches_no_store() {
    let store = seeded(&[fresh("ACT-x", Plan::Lifetime)]).await;
    let counting = Arc::new(CountingStore::new(store));
    let svc = service(counting.clone(), Arc::new(LicenseSigner::generate()));

    let mut req = request("ACT-x", "SHA256:abc");
    req.app_id = Some("someone_else".into());
    let err = svc.redeem(&req, now()).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidAppId);
    assert_eq!(counting.accesses(), 0);
}

async fn race(store: Arc<dyn CodeStore>, attempts: usize) {
    let signer = Arc::new(LicenseSigner::generate());
    let public = signer.public_key();
    let svc = service(store, signer);

    let mut handles = Vec::with_capacity(attempts);
    for i in 0..attempts {
        let svc = svc.clone();
        handles.push(tokio::spawn(async move {
            svc.redeem(&request("ACT-race", &format!("SHA256:device{i}")), now())
                .await
        }));
    }

    let mut winners = Vec::new();
    let mut used = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(license) => winners.push(license),
            Err(e) => {
                assert_eq!(e.code(), ErrorCode::CodeUsed);
                used += 1;
            }
        }
    }
    assert_eq!(winners.len(), 1);
    assert_eq!(used, attempts - 1);

    let json = serde_json::to_value(&winners[0]).unwrap();
    assert!(verifies_offline(json, public.as_bytes()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_redemptions_single_winner_memory() {
    race(seeded(&[fresh("ACT-race", Plan::Lifetime)]).await, 24).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_redemptions_single_winner_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileCodeStore::open(dir.path().join("codes.json")).unwrap());
    store.seed(&[fresh("ACT-race", Plan::Lifetime)]).await.unwrap();
    race(store, 24).await;
}

/// A store whose reserve never completes successfully.
struct UnreachableReserve {
    inner: MemoryCodeStore,
}

#[async_trait]
impl CodeStore for UnreachableReserve {
    fn backend_name(&self) -> &'static str {
        "unreachable"
    }
    async fn exists(&self, code: &CodeId) -> Result<bool, StoreError> {
        self.inner.exists(code).await
    }
    async fn lookup(&self, code: &CodeId) -> Result<Option<ActivationCode>, StoreError> {
        self.inner.lookup(code).await
    }
    async fn reserve(&self, _: &CodeId, _: Redemption) -> Result<ReserveOutcome, StoreError> {
        Err(StoreError::Timeout { op: "reserve", after_ms: 5000 })
    }
    async fn stats(&self) -> Result<CodeStats, StoreError> {
        self.inner.stats().await
    }
    async fn seed(&self, codes: &[NewCode]) -> Result<SeedReport, StoreError> {
        self.inner.seed(codes).await
    }
    async fn next_license_serial(&self) -> Result<u64, StoreError> {
        self.inner.next_license_serial().await
    }
}

#[tokio::test]
async fn reserve_timeout_is_server_error_and_retryable() {
    let inner = MemoryCodeStore::new();
    inner.seed(&[fresh("ACT-slow", Plan::Lifetime)]).await.unwrap();
    let svc = service(
        Arc::new(UnreachableReserve { inner }),
        Arc::new(LicenseSigner::generate()),
    );

    let err = svc.redeem(&request("ACT-slow", "SHA256:abc"), now()).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::ServerError);
    assert!(err.is_retryable());
    assert!(matches!(err, RedemptionError::Store(StoreError::Timeout { .. })));
    assert_eq!(err.public_message(), "internal server error");
}
