//! Access-counting wrapper.
//!
//! Wraps any store and counts calls that reach it. Tests use it to assert
//! that rejected requests never touch the store; it is also handy for
//! checking how many round trips a redemption costs.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use actv_core::CodeId;
use actv_state::{ActivationCode, Redemption};

use crate::error::StoreError;
use crate::store::{CodeStats, CodeStore, NewCode, ReserveOutcome, SeedReport};

/// A [`CodeStore`] that forwards to an inner store and counts every call.
pub struct CountingStore {
    inner: Arc<dyn CodeStore>,
    accesses: AtomicUsize,
    reserves: AtomicUsize,
}

impl CountingStore {
    /// Wrap `inner`.
    pub fn new(inner: Arc<dyn CodeStore>) -> Self {
        Self {
            inner,
            accesses: AtomicUsize::new(0),
            reserves: AtomicUsize::new(0),
        }
    }

    /// Calls of any kind so far.
    pub fn accesses(&self) -> usize {
        self.accesses.load(Ordering::SeqCst)
    }

    /// `reserve` calls so far.
    pub fn reserves(&self) -> usize {
        self.reserves.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.accesses.fetch_add(1, Ordering::SeqCst);
    }
}

impl std::fmt::Debug for CountingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CountingStore")
            .field("inner", &self.inner.backend_name())
            .field("accesses", &self.accesses())
            .field("reserves", &self.reserves())
            .finish()
    }
}

#[async_trait]
impl CodeStore for CountingStore {
    fn backend_name(&self) -> &'static str {
        self.inner.backend_name()
    }

    async fn exists(&self, code: &CodeId) -> Result<bool, StoreError> {
        self.hit();
        self.inner.exists(code).await
    }

    async fn lookup(&self, code: &CodeId) -> Result<Option<ActivationCode>, StoreError> {
        self.hit();
        self.inner.lookup(code).await
    }

    async fn reserve(
        &self,
        code: &CodeId,
        redemption: Redemption,
    ) -> Result<ReserveOutcome, StoreError> {
        self.hit();
        self.reserves.fetch_add(1, Ordering::SeqCst);
        self.inner.reserve(code, redemption).await
    }

    async fn stats(&self) -> Result<CodeStats, StoreError> {
        self.hit();
        self.inner.stats().await
    }

    async fn seed(&self, codes: &[NewCode]) -> Result<SeedReport, StoreError> {
        self.hit();
        self.inner.seed(codes).await
    }

    async fn next_license_serial(&self) -> Result<u64, StoreError> {
        self.hit();
        self.inner.next_license_serial().await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.hit();
        self.inner.ping().await
    }
}
