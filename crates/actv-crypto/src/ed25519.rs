//! # Ed25519 License Signatures
//!
//! ## Security Invariant
//!
//! - [`LicenseSigner::sign()`] accepts only `&CanonicalBytes`. A license can
//!   only be signed after it has been through the canonical encoder, which is
//!   the same byte production the offline verifier repeats.
//! - `LicenseSigner` does not implement `Serialize`, and its `Debug` output
//!   is redacted. The underlying `SigningKey` zeroizes on drop.
//!
//! ## Encodings
//!
//! Keys and signatures use standard base64 with padding. This matches the
//! `LICENSE_PRIVATE_KEY` environment variable and the public key string that
//! client builds embed.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use ed25519_dalek::Signer as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroizing;

use actv_core::{CanonicalBytes, CryptoError};

/// Algorithm identifier used in the tagged signature string.
pub const SIGNATURE_ALGORITHM: &str = "ed25519";

const SEED_LEN: usize = 32;
const PUBLIC_KEY_LEN: usize = 32;
const SIGNATURE_LEN: usize = 64;

/// An Ed25519 public key (32 bytes). Serializes as base64.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct LicensePublicKey([u8; PUBLIC_KEY_LEN]);

/// An Ed25519 signature (64 bytes). Serializes as base64.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct LicenseSignature([u8; SIGNATURE_LEN]);

/// The signature as attached to a license: `ed25519:<base64>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaggedSignature(LicenseSignature);

/// The issuer's signing key.
pub struct LicenseSigner {
    signing_key: ed25519_dalek::SigningKey,
}

// ---------------------------------------------------------------------------
// LicensePublicKey
// ---------------------------------------------------------------------------

impl LicensePublicKey {
    /// Wrap raw key bytes.
    pub fn from_bytes(bytes: [u8; PUBLIC_KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.0
    }

    /// Standard base64 encoding.
    pub fn to_base64(&self) -> String {
        BASE64.encode(self.0)
    }

    /// Parse a base64-encoded 32-byte public key.
    pub fn from_base64(s: &str) -> Result<Self, CryptoError> {
        let bytes = decode_fixed::<PUBLIC_KEY_LEN>(s.trim(), "public key")
            .map_err(CryptoError::KeyError)?;
        ed25519_dalek::VerifyingKey::from_bytes(&bytes)
            .map_err(|e| CryptoError::KeyError(format!("invalid public key: {e}")))?;
        Ok(Self(bytes))
    }

    /// Verify a signature over canonical bytes.
    pub fn verify(
        &self,
        data: &CanonicalBytes,
        signature: &LicenseSignature,
    ) -> Result<(), CryptoError> {
        if verify(data.as_bytes(), &signature.0, &self.0) {
            Ok(())
        } else {
            Err(CryptoError::VerificationFailed)
        }
    }
}

impl Serialize for LicensePublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for LicensePublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_base64(&s).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Debug for LicensePublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LicensePublicKey({})", self.to_base64())
    }
}

impl std::fmt::Display for LicensePublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_base64())
    }
}

// ---------------------------------------------------------------------------
// LicenseSignature / TaggedSignature
// ---------------------------------------------------------------------------

impl LicenseSignature {
    /// Wrap raw signature bytes.
    pub fn from_bytes(bytes: [u8; SIGNATURE_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw signature bytes.
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LEN] {
        &self.0
    }

    /// Standard base64 encoding.
    pub fn to_base64(&self) -> String {
        BASE64.encode(self.0)
    }

    /// Parse a base64-encoded 64-byte signature.
    pub fn from_base64(s: &str) -> Result<Self, CryptoError> {
        decode_fixed::<SIGNATURE_LEN>(s, "signature")
            .map(Self)
            .map_err(CryptoError::MalformedSignature)
    }
}

impl Serialize for LicenseSignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for LicenseSignature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_base64(&s).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Debug for LicenseSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let b64 = self.to_base64();
        write!(f, "LicenseSignature({}...)", &b64[..8])
    }
}

impl TaggedSignature {
    /// Tag a signature with the Ed25519 algorithm identifier.
    pub fn new(signature: LicenseSignature) -> Self {
        Self(signature)
    }

    /// The untagged signature.
    pub fn signature(&self) -> &LicenseSignature {
        &self.0
    }

    /// Parse `ed25519:<base64>`. Any other algorithm tag is rejected.
    pub fn parse(s: &str) -> Result<Self, CryptoError> {
        let (algorithm, encoded) = s
            .split_once(':')
            .ok_or_else(|| CryptoError::MalformedSignature("missing algorithm tag".into()))?;
        if algorithm != SIGNATURE_ALGORITHM {
            return Err(CryptoError::MalformedSignature(format!(
                "unsupported algorithm {algorithm:?}"
            )));
        }
        LicenseSignature::from_base64(encoded).map(Self)
    }
}

impl std::fmt::Display for TaggedSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{SIGNATURE_ALGORITHM}:{}", self.0.to_base64())
    }
}

impl std::str::FromStr for TaggedSignature {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ---------------------------------------------------------------------------
// LicenseSigner
// ---------------------------------------------------------------------------

impl LicenseSigner {
    /// Generate a fresh random signing key. Provisioning only.
    pub fn generate() -> Self {
        let mut csprng = rand::rngs::OsRng;
        Self {
            signing_key: ed25519_dalek::SigningKey::generate(&mut csprng),
        }
    }

    /// Build from a raw 32-byte seed.
    pub fn from_seed(seed: &[u8; SEED_LEN]) -> Self {
        Self {
            signing_key: ed25519_dalek::SigningKey::from_bytes(seed),
        }
    }

    /// Build from a base64-encoded 32-byte seed, as supplied in
    /// `LICENSE_PRIVATE_KEY`. Surrounding whitespace is ignored.
    pub fn from_base64_seed(encoded: &str) -> Result<Self, CryptoError> {
        let seed = Zeroizing::new(
            decode_fixed::<SEED_LEN>(encoded.trim(), "private key seed")
                .map_err(CryptoError::KeyError)?,
        );
        Ok(Self::from_seed(&seed))
    }

    /// The matching public key.
    pub fn public_key(&self) -> LicensePublicKey {
        LicensePublicKey(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign canonical bytes. Ed25519 signing is deterministic.
    pub fn sign(&self, data: &CanonicalBytes) -> LicenseSignature {
        LicenseSignature(self.signing_key.sign(data.as_bytes()).to_bytes())
    }

    /// Sign canonical bytes and tag the result for attachment to a license.
    pub fn sign_tagged(&self, data: &CanonicalBytes) -> TaggedSignature {
        TaggedSignature(self.sign(data))
    }

    /// The seed as base64, for key provisioning output.
    pub fn seed_base64(&self) -> Zeroizing<String> {
        let seed = Zeroizing::new(self.signing_key.to_bytes());
        Zeroizing::new(BASE64.encode(*seed))
    }
}

impl std::fmt::Debug for LicenseSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LicenseSigner")
            .field("public_key", &self.public_key())
            .field("signing_key", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Raw-byte operations
// ---------------------------------------------------------------------------

/// Generate a new keypair, returning the 32-byte private seed and the public key.
pub fn generate_keypair() -> (Zeroizing<[u8; SEED_LEN]>, LicensePublicKey) {
    let signer = LicenseSigner::generate();
    (Zeroizing::new(signer.signing_key.to_bytes()), signer.public_key())
}

/// Sign a raw message with a raw 32-byte private seed.
///
/// Fails with `CryptoError::KeyError` if the key is not exactly 32 bytes.
pub fn sign(message: &[u8], private_key: &[u8]) -> Result<[u8; SIGNATURE_LEN], CryptoError> {
    let seed: Zeroizing<[u8; SEED_LEN]> = Zeroizing::new(private_key.try_into().map_err(|_| {
        CryptoError::KeyError(format!(
            "private key must be {SEED_LEN} bytes, got {}",
            private_key.len()
        ))
    })?);
    let signing_key = ed25519_dalek::SigningKey::from_bytes(&seed);
    Ok(signing_key.sign(message).to_bytes())
}

/// Verify a raw signature over a raw message.
///
/// Returns `false` for wrong lengths, invalid key encodings, and bad
/// signatures alike. Never panics.
pub fn verify(message: &[u8], signature: &[u8], public_key: &[u8]) -> bool {
    let Ok(key_bytes) = <[u8; PUBLIC_KEY_LEN]>::try_from(public_key) else {
        return false;
    };
    let Ok(sig_bytes) = <[u8; SIGNATURE_LEN]>::try_from(signature) else {
        return false;
    };
    let Ok(verifying_key) = ed25519_dalek::VerifyingKey::from_bytes(&key_bytes) else {
        return false;
    };
    let sig = ed25519_dalek::Signature::from_bytes(&sig_bytes);
    verifying_key.verify_strict(message, &sig).is_ok()
}

fn decode_fixed<const N: usize>(encoded: &str, what: &str) -> Result<[u8; N], String> {
    let bytes = Zeroizing::new(
        BASE64
            .decode(encoded)
            .map_err(|e| format!("{what} is not valid base64: {e}"))?,
    );
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| format!("{what} must be {N} bytes, got {}", bytes.len()))
}
