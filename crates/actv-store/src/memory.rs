//! In-process code store.
//!
//! The map lives behind a `parking_lot::RwLock` that is never held across an
//! `.await`. `reserve` runs the whole check-and-mark under one write lock,
//! which is atomic within this process only.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use actv_core::CodeId;
use actv_state::{ActivationCode, Redemption};

use crate::error::StoreError;
use crate::store::{CodeStats, CodeStore, NewCode, ReserveOutcome, SeedReport};

/// Thread-safe, cloneable in-memory code store.
#[derive(Debug, Clone, Default)]
pub struct MemoryCodeStore {
    codes: Arc<RwLock<HashMap<CodeId, ActivationCode>>>,
    serial: Arc<AtomicU64>,
}

impl MemoryCodeStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-loaded with existing records (any state).
    pub fn with_records(records: impl IntoIterator<Item = ActivationCode>) -> Self {
        let map = records.into_iter().map(|r| (r.code.clone(), r)).collect();
        Self {
            codes: Arc::new(RwLock::new(map)),
            serial: Arc::new(AtomicU64::new(0)),
        }
    }
}

#[async_trait]
impl CodeStore for MemoryCodeStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn exists(&self, code: &CodeId) -> Result<bool, StoreError> {
        Ok(self.codes.read().contains_key(code))
    }

    async fn lookup(&self, code: &CodeId) -> Result<Option<ActivationCode>, StoreError> {
        Ok(self.codes.read().get(code).cloned())
    }

    async fn reserve(
        &self,
        code: &CodeId,
        redemption: Redemption,
    ) -> Result<ReserveOutcome, StoreError> {
        let mut guard = self.codes.write();
        let Some(record) = guard.get_mut(code) else {
            return Ok(ReserveOutcome::NotFound);
        };
        match record.redeem(redemption) {
            Ok(()) => Ok(ReserveOutcome::Reserved(record.clone())),
            Err(_) => Ok(ReserveOutcome::AlreadyUsed),
        }
    }

    async fn stats(&self) -> Result<CodeStats, StoreError> {
        let guard = self.codes.read();
        let used = guard.values().filter(|r| r.is_used()).count() as u64;
        Ok(CodeStats::from_counts(guard.len() as u64, used))
    }

    async fn seed(&self, codes: &[NewCode]) -> Result<SeedReport, StoreError> {
        let mut report = SeedReport::default();
        let mut guard = self.codes.write();
        for entry in codes {
            if guard.contains_key(&entry.code) {
                report.skipped += 1;
            } else {
                guard.insert(entry.code.clone(), entry.clone().into_record());
                report.inserted += 1;
            }
        }
        Ok(report)
    }

    async fn next_license_serial(&self) -> Result<u64, StoreError> {
        Ok(self.serial.fetch_add(1, Ordering::SeqCst) + 1)
    }
}
