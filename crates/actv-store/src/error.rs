//! Code store errors.
//!
//! The redemption path needs to tell "retry is safe" (no reservation
//! happened) apart from "this code is done". Store failures never encode
//! domain outcomes: `AlreadyUsed` and `NotFound` are values of
//! [`ReserveOutcome`](crate::ReserveOutcome), not errors.

use thiserror::Error;

/// Errors raised by a code store backend.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backing store could not be reached (connection refused, pool
    /// exhausted, network failure).
    #[error("code store unavailable: {0}")]
    Unavailable(String),

    /// A store call did not complete in time. Its effect is unknown to the
    /// caller, which must not assume either success or failure.
    #[error("code store operation {op} timed out after {after_ms} ms")]
    Timeout {
        /// Operation name.
        op: &'static str,
        /// Configured timeout.
        after_ms: u64,
    },

    /// A stored record could not be decoded.
    #[error("corrupt record {key}: {reason}")]
    Corrupt {
        /// Code or file the record came from.
        key: String,
        /// What was wrong with it.
        reason: String,
    },

    /// The backend rejected the operation (constraint violation, bad SQL).
    #[error("code store backend error: {0}")]
    Backend(String),

    /// Local file I/O failed.
    #[error("code store I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Whether the failure is transient, so retrying the whole request is
    /// safe.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout { .. } | Self::Io(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Self::Unavailable(err.to_string()),
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => Self::Corrupt {
                key: "row".to_string(),
                reason: err.to_string(),
            },
            other => Self::Backend(other.to_string()),
        }
    }
}
