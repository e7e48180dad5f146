//! Backend selection.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::error::StoreError;
use crate::file::FileCodeStore;
use crate::memory::MemoryCodeStore;
use crate::postgres::PgCodeStore;
use crate::store::CodeStore;

/// Default bound on a single store call.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_millis(5000);

/// Which backend to open.
#[derive(Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// Process memory. Nothing survives a restart.
    Memory,
    /// JSON file at the given path. Single process only.
    File(PathBuf),
    /// PostgreSQL at the given connection URL.
    Postgres(String),
}

impl StoreBackend {
    /// Pick a backend from an explicit kind (`memory`, `file`, `postgres`)
    /// or, when no kind is given, from whichever location is configured:
    /// a database URL wins over a codes file, and memory is the fallback.
    pub fn resolve(
        kind: Option<&str>,
        database_url: Option<String>,
        codes_file: Option<PathBuf>,
    ) -> Result<Self, String> {
        match kind.map(str::trim).filter(|k| !k.is_empty()) {
            Some("memory") => Ok(Self::Memory),
            Some("file") => codes_file
                .map(Self::File)
                .ok_or_else(|| "CODE_STORE=file requires CODES_FILE".to_string()),
            Some("postgres") => database_url
                .map(Self::Postgres)
                .ok_or_else(|| "CODE_STORE=postgres requires DATABASE_URL".to_string()),
            Some(other) => Err(format!(
                "unknown CODE_STORE {other:?} (expected memory, file or postgres)"
            )),
            None => Ok(match (database_url, codes_file) {
                (Some(url), _) => Self::Postgres(url),
                (None, Some(path)) => Self::File(path),
                (None, None) => Self::Memory,
            }),
        }
    }

    /// Backend name as reported by the opened store.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::File(_) => "file",
            Self::Postgres(_) => "postgres",
        }
    }
}

impl std::fmt::Debug for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Memory => f.write_str("Memory"),
            Self::File(path) => f.debug_tuple("File").field(path).finish(),
            Self::Postgres(_) => f.write_str("Postgres([REDACTED])"),
        }
    }
}

/// Store settings.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub timeout: Duration,
}

impl StoreConfig {
    /// Config with the default timeout.
    pub fn new(backend: StoreBackend) -> Self {
        Self {
            backend,
            timeout: DEFAULT_STORE_TIMEOUT,
        }
    }
}

/// Open the configured backend.
pub async fn open(config: &StoreConfig) -> Result<Arc<dyn CodeStore>, StoreError> {
    let store: Arc<dyn CodeStore> = match &config.backend {
        StoreBackend::Memory => {
            tracing::warn!("using in-memory code store; redemption state will not survive restarts");
            Arc::new(MemoryCodeStore::new())
        }
        StoreBackend::File(path) => {
            tracing::warn!(
                path = %path.display(),
                "using file code store; safe for a single local process only"
            );
            Arc::new(FileCodeStore::open(path.clone())?)
        }
        StoreBackend::Postgres(url) => Arc::new(PgCodeStore::connect(url, config.timeout).await?),
    };
    Ok(store)
}
