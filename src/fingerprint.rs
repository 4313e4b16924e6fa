//! Content fingerprints and shared-secret signatures
//!
//! `fingerprint` is a hex SHA-256 digest and `sign` is a hex HMAC-SHA256
//! tag. Both are computed over the canonical JSON of their input, so the
//! engine holds no record state and callers compose the two operations.

use crate::canonicalize::to_canonical_string;
use crate::errors::{ContentError, ContentResult};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;

type HmacSha256 = Hmac<Sha256>;

/// Process-wide signing secret. Key material never appears in `Debug` output.
#[derive(Clone)]
pub struct SigningSecret(Vec<u8>);

impl SigningSecret {
    pub fn new(secret: impl AsRef<[u8]>) -> ContentResult<Self> {
        let bytes = secret.as_ref();
        if bytes.is_empty() {
            return Err(ContentError::config("signing secret must not be empty"));
        }
        Ok(Self(bytes.to_vec()))
    }

    fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningSecret(<{} bytes>)", self.0.len())
    }
}

/// Deterministic hashing and keyed signing over canonical JSON
#[derive(Debug, Clone)]
pub struct FingerprintEngine {
    secret: SigningSecret,
}

impl FingerprintEngine {
    pub fn new(secret: SigningSecret) -> Self {
        Self { secret }
    }

    /// Hex SHA-256 over the canonical serialization of `material`
    pub fn fingerprint<T: Serialize + ?Sized>(&self, material: &T) -> ContentResult<String> {
        let canonical = to_canonical_string(material)?;
        Ok(hex::encode(Sha256::digest(canonical.as_bytes())))
    }

    /// Hex HMAC-SHA256 over the canonical serialization of `material`
    pub fn sign<T: Serialize + ?Sized>(&self, material: &T) -> ContentResult<String> {
        let canonical = to_canonical_string(material)?;
        let mut mac = self.mac()?;
        mac.update(canonical.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Check a hex tag produced by [`sign`](Self::sign). Comparison is constant-time.
    pub fn verify_signature<T: Serialize + ?Sized>(
        &self,
        material: &T,
        tag: &str,
    ) -> ContentResult<bool> {
        let Ok(expected) = hex::decode(tag) else {
            return Ok(false);
        };
        let canonical = to_canonical_string(material)?;
        let mut mac = self.mac()?;
        mac.update(canonical.as_bytes());
        Ok(mac.verify_slice(&expected).is_ok())
    }

    fn mac(&self) -> ContentResult<HmacSha256> {
        HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| ContentError::config(format!("invalid signing secret: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn engine(secret: &str) -> FingerprintEngine {
        FingerprintEngine::new(SigningSecret::new(secret).unwrap())
    }

    #[test]
    fn fingerprint_is_deterministic_and_order_independent() {
        let engine = engine("k");
        let a = engine.fingerprint(&json!({"title": "A", "type": "doc"})).unwrap();
        let b = engine.fingerprint(&json!({"type": "doc", "title": "A"})).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn fingerprint_does_not_depend_on_key() {
        let payload = json!({"title": "A"});
        assert_eq!(
            engine("one").fingerprint(&payload).unwrap(),
            engine("two").fingerprint(&payload).unwrap()
        );
    }

    #[test]
    fn different_keys_give_different_tags() {
        let payload = json!({"title": "A"});
        let a = engine("one").sign(&payload).unwrap();
        let b = engine("two").sign(&payload).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn signature_verifies_only_for_same_material_and_key() {
        let engine = engine("secret");
        let tag = engine.sign("abc123").unwrap();
        assert!(engine.verify_signature("abc123", &tag).unwrap());
        assert!(!engine.verify_signature("abc124", &tag).unwrap());
        assert!(!engine.verify_signature("abc123", "not-hex").unwrap());
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert!(SigningSecret::new("").is_err());
    }

    #[test]
    fn debug_hides_key_material() {
        let secret = SigningSecret::new("hunter2").unwrap();
        assert!(!format!("{secret:?}").contains("hunter2"));
    }

    #[test]
    fn non_string_map_keys_are_encoding_errors() {
        let engine = engine("k");
        let mut material = std::collections::BTreeMap::new();
        material.insert(vec![1u8, 2], "value");
        let err = engine.fingerprint(&material).unwrap_err();
        assert!(matches!(err, ContentError::Encoding { .. }));
    }
}
