//! # Error Hierarchy
//!
//! Structured error types shared across the activation workspace, built with
//! `thiserror`. No `Box<dyn Error>`, no `.unwrap()` outside tests.

use thiserror::Error;

/// Top-level error type for foundational operations.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Canonical encoding failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// Domain primitive validation failure.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Cryptographic operation failure.
    #[error("cryptographic error: {0}")]
    Crypto(#[from] CryptoError),
}

/// Errors during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    #[error("float values are not permitted in canonical representations: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Errors in signing key handling and signature operations.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// A private or public key is malformed (wrong length or encoding).
    #[error("key error: {0}")]
    KeyError(String),

    /// A signature string is malformed (unknown algorithm tag, bad encoding).
    #[error("malformed signature: {0}")]
    MalformedSignature(String),

    /// Signature verification failed.
    #[error("signature verification failed")]
    VerificationFailed,
}

/// Validation failures for domain identifiers and timestamps.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or blank.
    #[error("{field} is required")]
    Missing {
        /// The field name as it appears on the wire.
        field: &'static str,
    },

    /// A field exceeds its maximum length.
    #[error("{field} exceeds {max} characters")]
    TooLong {
        /// The field name as it appears on the wire.
        field: &'static str,
        /// Maximum permitted length in characters.
        max: usize,
    },

    /// A field contains control characters.
    #[error("{field} contains control characters")]
    ControlCharacters {
        /// The field name as it appears on the wire.
        field: &'static str,
    },

    /// Timestamp string is not valid UTC ISO 8601.
    #[error("invalid timestamp: \"{value}\" ({reason})")]
    InvalidTimestamp {
        /// The string that failed to parse.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalization_error_float_rejected() {
        let err = CanonicalizationError::FloatRejected(3.25);
        let msg = format!("{err}");
        assert!(msg.contains("float values are not permitted"));
        assert!(msg.contains("3.25"));
    }

    #[test]
    fn core_error_wraps_validation() {
        let err = CoreError::from(ValidationError::Missing { field: "device_hash" });
        assert_eq!(format!("{err}"), "validation error: device_hash is required");
    }

    #[test]
    fn validation_error_too_long_display() {
        let err = ValidationError::TooLong { field: "code", max: 128 };
        assert_eq!(format!("{err}"), "code exceeds 128 characters");
    }

    #[test]
    fn crypto_error_display() {
        let err = CoreError::from(CryptoError::KeyError("seed must be 32 bytes".into()));
        assert!(format!("{err}").contains("seed must be 32 bytes"));
    }
}
