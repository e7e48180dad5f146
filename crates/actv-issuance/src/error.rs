//! Redemption error taxonomy.
//!
//! | Class | Codes | Retry? |
//! |---|---|---|
//! | client input | `INVALID_REQUEST`, `INVALID_APP_ID` | no, fix the request |
//! | domain | `CODE_NOT_FOUND`, `CODE_USED`, `CODE_EXPIRED` | no, terminal for the code |
//! | infrastructure | `SERVER_ERROR` (store unavailable) | yes, nothing was reserved |
//! | configuration | `SERVER_ERROR` (no key, issuance failure) | no |

use serde::{Deserialize, Serialize};
use thiserror::Error;

use actv_core::{CanonicalizationError, CodeId, Timestamp};
use actv_store::StoreError;

/// Wire-level error codes returned to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidRequest,
    InvalidAppId,
    CodeNotFound,
    CodeUsed,
    CodeExpired,
    ServerError,
}

impl ErrorCode {
    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::InvalidAppId => "INVALID_APP_ID",
            Self::CodeNotFound => "CODE_NOT_FOUND",
            Self::CodeUsed => "CODE_USED",
            Self::CodeExpired => "CODE_EXPIRED",
            Self::ServerError => "SERVER_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a redemption did not produce a license.
#[derive(Error, Debug)]
pub enum RedemptionError {
    /// Missing or malformed request field.
    #[error("{0}")]
    InvalidRequest(String),

    /// The application id is not on the allow-list.
    #[error("app_id {0:?} is not allowed")]
    InvalidAppId(String),

    /// No such activation code.
    #[error("activation code not found")]
    CodeNotFound,

    /// The code has already been redeemed.
    #[error("activation code has already been used")]
    CodeUsed,

    /// The code's expiry has passed.
    #[error("activation code expired at {expires_at}")]
    CodeExpired {
        /// When it expired.
        expires_at: Timestamp,
    },

    /// No signing key is configured. Checked before any store access.
    #[error("license signing key is not configured")]
    SigningKeyMissing,

    /// The code store failed. If transient, nothing was reserved.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The code was reserved but the license could not be produced. The code
    /// stays consumed and needs manual remediation.
    #[error("code {code} reserved but license issuance failed: {source}")]
    IssuanceFailed {
        /// The consumed code.
        code: CodeId,
        /// Underlying encoding failure.
        #[source]
        source: CanonicalizationError,
    },
}

impl RedemptionError {
    /// The wire error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidRequest(_) => ErrorCode::InvalidRequest,
            Self::InvalidAppId(_) => ErrorCode::InvalidAppId,
            Self::CodeNotFound => ErrorCode::CodeNotFound,
            Self::CodeUsed => ErrorCode::CodeUsed,
            Self::CodeExpired { .. } => ErrorCode::CodeExpired,
            Self::SigningKeyMissing | Self::Store(_) | Self::IssuanceFailed { .. } => {
                ErrorCode::ServerError
            }
        }
    }

    /// Whether resubmitting the same request can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_transient())
    }

    /// Message safe to return to clients. Server-side detail is replaced
    /// with a generic message.
    pub fn public_message(&self) -> String {
        match self.code() {
            ErrorCode::ServerError => "internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}
