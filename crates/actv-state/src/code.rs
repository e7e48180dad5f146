//! # Activation Code Lifecycle
//!
//! ```text
//! Unused ──(redeem)──▶ Used { device_hash, license_id, used_at }   (terminal)
//! ```
//!
//! Expiry is not a lifecycle state. It is a property of the code's
//! `expires_at` checked against the current time, and it applies to Unused
//! and Used codes alike.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use actv_core::{CodeId, DeviceHash, LicenseId, Timestamp};

/// The plan an activation code grants. Copied verbatim into the license.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    /// Perpetual license.
    Lifetime,
    /// Time-limited evaluation license.
    Trial,
}

impl Plan {
    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lifetime => "lifetime",
            Self::Trial => "trial",
        }
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Plan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lifetime" => Ok(Self::Lifetime),
            "trial" => Ok(Self::Trial),
            other => Err(format!("unknown plan {other:?}")),
        }
    }
}

/// Flat view of a code's lifecycle, without metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeStatus {
    /// Not yet redeemed.
    Unused,
    /// Redeemed (terminal).
    Used,
}

impl CodeStatus {
    /// Wire name, also the database column value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unused => "unused",
            Self::Used => "used",
        }
    }
}

impl std::fmt::Display for CodeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a redemption bound to the code. Set exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redemption {
    /// Device fingerprint from the redeeming request.
    pub device_hash: DeviceHash,
    /// License issued for this redemption.
    pub license_id: LicenseId,
    /// When the code was consumed.
    pub used_at: Timestamp,
}

/// Lifecycle state with its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CodeLifecycle {
    /// Not yet redeemed.
    Unused,
    /// Redeemed, with the binding that redemption produced.
    Used(Redemption),
}

/// An activation code record as held by the code store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationCode {
    /// The code string, immutable after creation.
    pub code: CodeId,
    /// Plan granted on redemption.
    pub plan: Plan,
    /// Absolute expiry. Copied into the license.
    pub expires_at: Timestamp,
    /// Current lifecycle state.
    #[serde(flatten)]
    pub lifecycle: CodeLifecycle,
}

/// Lifecycle transition failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodeError {
    /// The code was already redeemed.
    #[error("activation code {code} is already used")]
    AlreadyUsed {
        /// The code.
        code: CodeId,
    },
}

impl ActivationCode {
    /// A fresh, unused code.
    pub fn new(code: CodeId, plan: Plan, expires_at: Timestamp) -> Self {
        Self {
            code,
            plan,
            expires_at,
            lifecycle: CodeLifecycle::Unused,
        }
    }

    /// Flat status.
    pub fn status(&self) -> CodeStatus {
        match self.lifecycle {
            CodeLifecycle::Unused => CodeStatus::Unused,
            CodeLifecycle::Used(_) => CodeStatus::Used,
        }
    }

    /// Whether the code has been redeemed.
    pub fn is_used(&self) -> bool {
        matches!(self.lifecycle, CodeLifecycle::Used(_))
    }

    /// The redemption binding, if used.
    pub fn redemption(&self) -> Option<&Redemption> {
        match &self.lifecycle {
            CodeLifecycle::Used(r) => Some(r),
            CodeLifecycle::Unused => None,
        }
    }

    /// True if `now` is at or past the expiry.
    pub fn is_expired_at(&self, now: &Timestamp) -> bool {
        self.expires_at.has_passed(now)
    }

    /// Transition `Unused → Used`.
    ///
    /// Callers must hold whatever exclusion their store uses for the
    /// conditional write; this method only guards the state machine.
    pub fn redeem(&mut self, redemption: Redemption) -> Result<(), CodeError> {
        if self.is_used() {
            return Err(CodeError::AlreadyUsed {
                code: self.code.clone(),
            });
        }
        self.lifecycle = CodeLifecycle::Used(redemption);
        Ok(())
    }
}
