//! The `CodeStore` contract shared by every backend.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use actv_core::{CodeId, Timestamp};
use actv_state::{ActivationCode, Plan, Redemption};

use crate::error::StoreError;

/// Result of the atomic `Unused → Used` transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReserveOutcome {
    /// This call consumed the code. Carries the record as written.
    Reserved(ActivationCode),
    /// The code was already used; nothing was written.
    AlreadyUsed,
    /// No such code.
    NotFound,
}

/// Code counts for operational visibility.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeStats {
    pub total: u64,
    pub used: u64,
    pub available: u64,
}

impl CodeStats {
    /// Build from total and used counts.
    pub fn from_counts(total: u64, used: u64) -> Self {
        Self {
            total,
            used,
            available: total.saturating_sub(used),
        }
    }
}

/// A code to provision in the `Unused` state.
///
/// Deserializes from seed files. Fields other than `code`, `plan` and
/// `expires_at` (such as a stale `used` flag) are ignored: provisioning
/// never creates used codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCode {
    pub code: CodeId,
    pub plan: Plan,
    pub expires_at: Timestamp,
}

impl NewCode {
    /// The unused record this entry provisions.
    pub fn into_record(self) -> ActivationCode {
        ActivationCode::new(self.code, self.plan, self.expires_at)
    }
}

/// Outcome of a bulk seed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedReport {
    /// Codes newly created.
    pub inserted: u64,
    /// Codes already present and left untouched.
    pub skipped: u64,
}

/// Durable activation code lifecycle storage.
///
/// Implementations must make [`reserve`](CodeStore::reserve) a single
/// conditional write against the durable store. A reserve that cannot
/// complete returns `Err`; callers treat that as "outcome unknown" and do
/// not sign anything.
#[async_trait]
pub trait CodeStore: Send + Sync {
    /// Short backend name for health reporting (`memory`, `file`, `postgres`).
    fn backend_name(&self) -> &'static str;

    /// Whether the code exists, in any state.
    async fn exists(&self, code: &CodeId) -> Result<bool, StoreError>;

    /// Fetch the full record. `None` if the code is unknown.
    async fn lookup(&self, code: &CodeId) -> Result<Option<ActivationCode>, StoreError>;

    /// Atomically transition the code from `Unused` to `Used`, binding the
    /// redemption metadata. Never overwrites an existing binding.
    async fn reserve(
        &self,
        code: &CodeId,
        redemption: Redemption,
    ) -> Result<ReserveOutcome, StoreError>;

    /// Total, used and available counts.
    async fn stats(&self) -> Result<CodeStats, StoreError>;

    /// Provision codes as `Unused`. Codes that already exist are skipped,
    /// whatever their state.
    async fn seed(&self, codes: &[NewCode]) -> Result<SeedReport, StoreError>;

    /// Next value of the store's monotonically increasing license serial.
    /// Values are never reused, even if the reservation that requested one
    /// does not go through.
    async fn next_license_serial(&self) -> Result<u64, StoreError>;

    /// Connectivity probe. Read-only.
    async fn ping(&self) -> Result<(), StoreError> {
        self.stats().await.map(|_| ())
    }
}
