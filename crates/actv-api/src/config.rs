//! # Process Configuration
//!
//! Everything the service needs is read from environment variables once at
//! startup. Reading goes through a lookup function so tests can supply a map
//! instead of mutating the process environment.
//!
//! | Variable | Default |
//! |---|---|
//! | `PORT` | `8080` |
//! | `LICENSE_PRIVATE_KEY` | unset: redemption answers `SERVER_ERROR` |
//! | `ALLOWED_APP_IDS` | `moments_ai` |
//! | `ADMIN_TOKEN` | unset: `/api/health` is open |
//! | `CODE_STORE` | inferred from `DATABASE_URL` / `CODES_FILE`, else `memory` |
//! | `STORE_TIMEOUT_MS` | `5000` |
//! | `LOG_FORMAT` | text; `json` for JSON lines |

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use actv_crypto::LicenseSigner;
use actv_issuance::AllowedApps;
use actv_store::backend::DEFAULT_STORE_TIMEOUT;
use actv_store::{StoreBackend, StoreConfig};

/// A configuration value that cannot be used.
#[derive(Error, Debug)]
#[error("invalid {var}: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub reason: String,
}

impl ConfigError {
    fn new(var: &'static str, reason: impl Into<String>) -> Self {
        Self {
            var,
            reason: reason.into(),
        }
    }
}

/// Application configuration.
///
/// Custom `Debug` redacts the admin token; the signer's own `Debug` shows
/// only its public key.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// License signing key. `None` keeps the process up for health checks
    /// but refuses every redemption.
    pub signer: Option<Arc<LicenseSigner>>,
    pub allowed_apps: AllowedApps,
    /// Bearer token for `/api/health`. `None` leaves it open.
    pub admin_token: Option<String>,
    pub store: StoreConfig,
    pub log_json: bool,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("signer", &self.signer)
            .field("allowed_apps", &self.allowed_apps)
            .field(
                "admin_token",
                &self.admin_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("store", &self.store)
            .field("log_json", &self.log_json)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            signer: None,
            allowed_apps: AllowedApps::default(),
            admin_token: None,
            store: StoreConfig::new(StoreBackend::Memory),
            log_json: false,
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let port = match get("PORT") {
            Some(p) => p
                .trim()
                .parse::<u16>()
                .map_err(|e| ConfigError::new("PORT", e.to_string()))?,
            None => 8080,
        };

        let signer = get("LICENSE_PRIVATE_KEY")
            .map(|encoded| {
                let encoded = zeroize::Zeroizing::new(encoded);
                LicenseSigner::from_base64_seed(&encoded)
                    .map(Arc::new)
                    .map_err(|e| ConfigError::new("LICENSE_PRIVATE_KEY", e.to_string()))
            })
            .transpose()?;

        let allowed_apps = match get("ALLOWED_APP_IDS") {
            Some(list) => AllowedApps::parse_list(&list),
            None => AllowedApps::default(),
        };
        if allowed_apps.ids().is_empty() {
            return Err(ConfigError::new("ALLOWED_APP_IDS", "no application ids listed"));
        }

        let backend = StoreBackend::resolve(
            get("CODE_STORE").as_deref(),
            get("DATABASE_URL"),
            get("CODES_FILE").map(PathBuf::from),
        )
        .map_err(|reason| ConfigError::new("CODE_STORE", reason))?;

        let timeout = match get("STORE_TIMEOUT_MS") {
            Some(ms) => match ms.trim().parse::<u64>() {
                Ok(0) => return Err(ConfigError::new("STORE_TIMEOUT_MS", "must be positive")),
                Ok(ms) => Duration::from_millis(ms),
                Err(e) => return Err(ConfigError::new("STORE_TIMEOUT_MS", e.to_string())),
            },
            None => DEFAULT_STORE_TIMEOUT,
        };

        let log_json = get("LOG_FORMAT").is_some_and(|f| f.trim().eq_ignore_ascii_case("json"));

        Ok(Self {
            port,
            signer,
            allowed_apps,
            admin_token: get("ADMIN_TOKEN"),
            store: StoreConfig { backend, timeout },
            log_json,
        })
    }
}
