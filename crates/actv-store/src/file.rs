//! JSON file code store for single-process local development.
//!
//! The whole store is one JSON document:
//!
//! ```json
//! { "license_serial": 12, "codes": [ { "code": "ACT-…", "plan": "lifetime", … } ] }
//! ```
//!
//! Every mutation writes a complete new document to a temporary file in the
//! same directory and renames it over the old one, so a crash leaves either
//! the old or the new state on disk. The in-memory copy is only updated after
//! the rename succeeds.
//!
//! The write and its `fsync` run on tokio's blocking pool, never on a
//! runtime worker. An async mutex is held across the write so mutations
//! commit in order; reads wait for an in-flight write to finish.
//!
//! Exclusion is a process-local mutex. Two processes pointed at the same
//! file will race; use [`PgCodeStore`](crate::PgCodeStore) for anything
//! beyond one local process.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use serde::{Deserialize, Serialize};

use actv_core::CodeId;
use actv_state::{ActivationCode, Redemption};

use crate::error::StoreError;
use crate::store::{CodeStats, CodeStore, NewCode, ReserveOutcome, SeedReport};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Document {
    #[serde(default)]
    license_serial: u64,
    #[serde(default)]
    codes: Vec<ActivationCode>,
}

#[derive(Debug, Clone, Default)]
struct State {
    license_serial: u64,
    codes: BTreeMap<CodeId, ActivationCode>,
}

impl State {
    fn to_document(&self) -> Document {
        Document {
            license_serial: self.license_serial,
            codes: self.codes.values().cloned().collect(),
        }
    }
}

/// File-backed code store.
#[derive(Debug)]
pub struct FileCodeStore {
    path: PathBuf,
    state: Mutex<State>,
}

impl FileCodeStore {
    /// Open the store at `path`, creating an empty one if the file does not
    /// exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let state = match std::fs::read(&path) {
            Ok(bytes) => {
                let doc: Document =
                    serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt {
                        key: path.display().to_string(),
                        reason: e.to_string(),
                    })?;
                let codes = doc
                    .codes
                    .into_iter()
                    .map(|r| (r.code.clone(), r))
                    .collect();
                State {
                    license_serial: doc.license_serial,
                    codes,
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => State::default(),
            Err(e) => return Err(StoreError::Io(e)),
        };
        tracing::debug!(path = %path.display(), codes = state.codes.len(), "opened code file");
        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `f` to a copy of the state, persist it, then commit it.
    async fn mutate<R>(
        &self,
        f: impl FnOnce(&mut State) -> (R, bool),
    ) -> Result<R, StoreError> {
        let mut guard = self.state.lock().await;
        let mut next = guard.clone();
        let (result, changed) = f(&mut next);
        if changed {
            let path = self.path.clone();
            let doc = next.to_document();
            tokio::task::spawn_blocking(move || write_atomically(&path, &doc))
                .await
                .map_err(|e| StoreError::Backend(format!("file write task failed: {e}")))??;
            *guard = next;
        }
        Ok(result)
    }
}

fn write_atomically(path: &Path, doc: &Document) -> Result<(), StoreError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let bytes = serde_json::to_vec_pretty(doc).map_err(|e| StoreError::Corrupt {
        key: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(&bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}

#[async_trait]
impl CodeStore for FileCodeStore {
    fn backend_name(&self) -> &'static str {
        "file"
    }

    async fn exists(&self, code: &CodeId) -> Result<bool, StoreError> {
        Ok(self.state.lock().await.codes.contains_key(code))
    }

    async fn lookup(&self, code: &CodeId) -> Result<Option<ActivationCode>, StoreError> {
        Ok(self.state.lock().await.codes.get(code).cloned())
    }

    async fn reserve(
        &self,
        code: &CodeId,
        redemption: Redemption,
    ) -> Result<ReserveOutcome, StoreError> {
        self.mutate(|state| match state.codes.get_mut(code) {
            None => (ReserveOutcome::NotFound, false),
            Some(record) => match record.redeem(redemption) {
                Ok(()) => (ReserveOutcome::Reserved(record.clone()), true),
                Err(_) => (ReserveOutcome::AlreadyUsed, false),
            },
        })
        .await
    }

    async fn stats(&self) -> Result<CodeStats, StoreError> {
        let guard = self.state.lock().await;
        let used = guard.codes.values().filter(|r| r.is_used()).count() as u64;
        Ok(CodeStats::from_counts(guard.codes.len() as u64, used))
    }

    async fn seed(&self, codes: &[NewCode]) -> Result<SeedReport, StoreError> {
        self.mutate(|state| {
            let mut report = SeedReport::default();
            for entry in codes {
                if state.codes.contains_key(&entry.code) {
                    report.skipped += 1;
                } else {
                    state
                        .codes
                        .insert(entry.code.clone(), entry.clone().into_record());
                    report.inserted += 1;
                }
            }
            let changed = report.inserted > 0;
            (report, changed)
        })
        .await
    }

    async fn next_license_serial(&self) -> Result<u64, StoreError> {
        self.mutate(|state| {
            state.license_serial += 1;
            (state.license_serial, true)
        })
        .await
    }
}
