//! # Domain Identity Newtypes
//!
//! Newtype wrappers for the identifiers that cross crate boundaries. You
//! cannot pass a `DeviceHash` where a `CodeId` is expected, and every value
//! has passed validation at construction or deserialization.
//!
//! Device hashes and codes are opaque: they are compared byte-for-byte and
//! never normalized (no trimming, no case folding), because the verifier in
//! client software compares the exact string it submitted.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::temporal::Timestamp;

/// Maximum length of an activation code, in characters.
pub const MAX_CODE_LEN: usize = 128;
/// Maximum length of a device fingerprint, in characters.
pub const MAX_DEVICE_HASH_LEN: usize = 256;
/// Maximum length of an application identifier, in characters.
pub const MAX_APP_ID_LEN: usize = 64;
/// Maximum length of a license identifier, in characters.
pub const MAX_LICENSE_ID_LEN: usize = 64;

/// Shared validation for opaque text identifiers.
pub fn validate_text(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Missing { field });
    }
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    if value.chars().any(char::is_control) {
        return Err(ValidationError::ControlCharacters { field });
    }
    Ok(())
}

/// A single-use activation code, e.g. `ACT-M4B1f_jf9z2_v3yHK5tHXw`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CodeId(String);

/// Opaque client-supplied device fingerprint, e.g. `SHA256:ab12…`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceHash(String);

/// Identifier of the client application requesting a license.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AppId(String);

/// Identifier of an issued license, `LIC-YYYYMMDD-NNNNNN`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LicenseId(String);

impl CodeId {
    /// Validate and wrap an activation code.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        validate_text("code", &value, MAX_CODE_LEN)?;
        Ok(Self(value))
    }

    /// Borrow the code string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl DeviceHash {
    /// Validate and wrap a device fingerprint.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        validate_text("device_hash", &value, MAX_DEVICE_HASH_LEN)?;
        Ok(Self(value))
    }

    /// Borrow the fingerprint string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A short prefix that is safe to put in logs.
    pub fn log_prefix(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl AppId {
    /// Validate and wrap an application identifier.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        validate_text("app_id", &value, MAX_APP_ID_LEN)?;
        Ok(Self(value))
    }

    /// Borrow the application identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl LicenseId {
    /// Validate and wrap an existing license identifier (e.g. read from a store).
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        validate_text("license_id", &value, MAX_LICENSE_ID_LEN)?;
        Ok(Self(value))
    }

    /// Build the identifier for an issuance from its UTC date and a
    /// store-assigned serial number.
    ///
    /// Uniqueness comes from the serial, which the code store hands out from
    /// an atomic counter. The date prefix is for human traceability only.
    pub fn issue(issued_at: &Timestamp, serial: u64) -> Self {
        Self(format!("LIC-{}-{serial:06}", issued_at.compact_date()))
    }

    /// Borrow the identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

macro_rules! string_conversions {
    ($($ty:ident),*) => {
        $(
            impl TryFrom<String> for $ty {
                type Error = ValidationError;

                fn try_from(value: String) -> Result<Self, Self::Error> {
                    Self::new(value)
                }
            }

            impl From<$ty> for String {
                fn from(value: $ty) -> String {
                    value.0
                }
            }

            impl std::fmt::Display for $ty {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    f.write_str(&self.0)
                }
            }
        )*
    };
}

string_conversions!(CodeId, DeviceHash, AppId, LicenseId);
