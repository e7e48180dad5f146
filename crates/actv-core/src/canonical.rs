//! # Canonical Serialization: Verifier-Compatible Byte Production
//!
//! This module defines `CanonicalBytes`, the sole construction path for bytes
//! that are signed by the issuer and re-derived by the offline verifier.
//!
//! ## Security Invariant
//!
//! `CanonicalBytes` has a private inner field. The only way to construct it
//! is through [`CanonicalBytes::new()`] (or [`CanonicalBytes::from_value()`]),
//! which applies the full normalization pipeline before serialization. Any
//! function that signs or verifies license data accepts `&CanonicalBytes`, so
//! signing a non-canonical rendering is a type error.
//!
//! ## Encoding Rules
//!
//! 1. **Sorted keys**: every object, at every depth, is emitted with its keys
//!    in Unicode code-point order (byte order of the UTF-8 key).
//! 2. **Arrays keep their order.**
//! 3. **Compact separators**: `,` and `:` with no whitespace anywhere.
//! 4. **Scalars**: `null`, `true`/`false`, integers in minimal decimal form
//!    (no `+`, no leading zeros, no exponent), strings as UTF-8 with only the
//!    structurally required escapes (`"`, `\`, control characters).
//! 5. **Reject floats**: non-integer numbers have no agreed textual form
//!    across implementations and are refused.
//!
//! The output is byte-identical to the client verifier's
//! `json.dumps(obj, sort_keys=True, separators=(",", ":"), ensure_ascii=False).encode("utf-8")`.

use serde::Serialize;
use serde_json::Value;

use crate::error::CanonicalizationError;

/// Bytes produced exclusively by the canonical encoding pipeline.
///
/// # Invariants
///
/// - The only constructors are `CanonicalBytes::new()` and `CanonicalBytes::from_value()`.
/// - Object keys are sorted by code point at every nesting depth.
/// - No whitespace outside string literals.
/// - No floating-point numbers.
/// - The content is valid UTF-8 JSON.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Construct canonical bytes from any serializable value.
    ///
    /// The result is independent of the order in which mapping keys were
    /// inserted or declared.
    ///
    /// # Errors
    ///
    /// Returns `CanonicalizationError::FloatRejected` if the value contains a
    /// non-integer number, `CanonicalizationError::SerializationFailed` if the
    /// value cannot be represented as JSON.
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        Self::from_value(value)
    }

    /// Construct canonical bytes from an already-parsed JSON value.
    pub fn from_value(value: Value) -> Result<Self, CanonicalizationError> {
        let normalized = normalize(value)?;
        let bytes = serde_json::to_vec(&normalized)?;
        Ok(Self(bytes))
    }

    /// Decode the canonical bytes back into a JSON value.
    ///
    /// Re-encoding the decoded value yields the same bytes.
    pub fn decode(&self) -> Result<Value, CanonicalizationError> {
        Ok(serde_json::from_slice(&self.0)?)
    }

    /// Access the canonical bytes for signing or verification.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The canonical text. Always valid UTF-8 by construction.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or_default()
    }

    /// Returns the length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the canonical byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Display for CanonicalBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recursively normalize a JSON value.
///
/// Objects are rebuilt with keys inserted in sorted order. This holds whether
/// `serde_json::Map` is backed by a `BTreeMap` or, when another crate in the
/// build enables `preserve_order`, by an insertion-ordered map.
fn normalize(value: Value) -> Result<Value, CanonicalizationError> {
    match value {
        Value::Null | Value::Bool(_) | Value::String(_) => Ok(value),
        Value::Number(ref n) => {
            if !n.is_i64() && !n.is_u64() {
                return Err(CanonicalizationError::FloatRejected(
                    n.as_f64().unwrap_or(f64::NAN),
                ));
            }
            Ok(value)
        }
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut sorted = serde_json::Map::with_capacity(entries.len());
            for (k, v) in entries {
                sorted.insert(k, normalize(v)?);
            }
            Ok(Value::Object(sorted))
        }
        Value::Array(arr) => {
            let normalized: Result<Vec<_>, _> = arr.into_iter().map(normalize).collect();
            Ok(Value::Array(normalized?))
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// JSON values without floats: the domain the verifier agrees on.
    fn json_value_no_floats() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| serde_json::json!(n)),
            "[a-zA-Z0-9_:\\- ]{0,40}".prop_map(Value::String),
        ];
        leaf.prop_recursive(4, 64, 8, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                prop::collection::btree_map("[a-zA-Z_]{1,8}", inner, 0..6).prop_map(|m| {
                    Value::Object(m.into_iter().collect())
                }),
            ]
        })
    }

    /// Rebuild every object with its keys inserted in reverse order.
    fn reverse_insertion(value: Value) -> Value {
        match value {
            Value::Object(map) => {
                let mut entries: Vec<_> = map.into_iter().collect();
                entries.reverse();
                let mut out = serde_json::Map::new();
                for (k, v) in entries {
                    out.insert(k, reverse_insertion(v));
                }
                Value::Object(out)
            }
            Value::Array(arr) => Value::Array(arr.into_iter().map(reverse_insertion).collect()),
            other => other,
        }
    }

    proptest! {
        #[test]
        fn canonical_bytes_deterministic(value in json_value_no_floats()) {
            let a = CanonicalBytes::new(&value).unwrap();
            let b = CanonicalBytes::new(&value).unwrap();
            prop_assert_eq!(a.as_bytes(), b.as_bytes());
        }

        #[test]
        fn canonical_bytes_ignore_insertion_order(value in json_value_no_floats()) {
            let a = CanonicalBytes::new(&value).unwrap();
            let b = CanonicalBytes::new(&reverse_insertion(value)).unwrap();
            prop_assert_eq!(a, b);
        }

        #[test]
        fn canonical_bytes_idempotent(value in json_value_no_floats()) {
            let first = CanonicalBytes::new(&value).unwrap();
            let again = CanonicalBytes::from_value(first.decode().unwrap()).unwrap();
            prop_assert_eq!(first, again);
        }

        #[test]
        fn canonical_bytes_have_no_structural_whitespace(
            keys in prop::collection::btree_set("[a-z]{1,8}", 1..6)
        ) {
            let map: serde_json::Map<String, Value> = keys
                .iter()
                .enumerate()
                .map(|(i, k)| (k.clone(), serde_json::json!([i, {"k": k}])))
                .collect();
            let cb = CanonicalBytes::new(&Value::Object(map)).unwrap();
            prop_assert!(!cb.as_str().contains(' '));
            prop_assert!(!cb.as_str().contains('\n'));
        }
    }
}
