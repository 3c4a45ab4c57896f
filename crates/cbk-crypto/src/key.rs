//! Raw symmetric keys: hex decoding at the CLI boundary and random generation

use rand::RngCore;
use zeroize::Zeroize;

use crate::error::{CryptoError, CryptoResult};

/// Default size of a generated key in bytes (AES-256)
pub const DEFAULT_KEY_SIZE: usize = 32;

/// A caller-supplied raw key. Zeroized on drop.
#[derive(Clone)]
pub struct SecretKey {
    bytes: Vec<u8>,
}

impl SecretKey {
    /// Decode a hexadecimal key. The input is never echoed in the error.
    pub fn from_hex(encoded: &str) -> CryptoResult<Self> {
        let bytes = hex::decode(encoded.trim()).map_err(|_| {
            CryptoError::Construction("invalid key format: expected a hexadecimal string".into())
        })?;
        Ok(Self { bytes })
    }

    /// Generate `size` random bytes.
    pub fn generate(size: usize) -> CryptoResult<Self> {
        if size == 0 {
            return Err(CryptoError::Construction(
                "key size must be at least 1 byte".into(),
            ));
        }
        let mut bytes = vec![0u8; size];
        rand::thread_rng().fill_bytes(&mut bytes);
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Lowercase hexadecimal encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }
}

impl Drop for SecretKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretKey")
            .field("len", &self.bytes.len())
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_hex_length() {
        let key = SecretKey::generate(16).unwrap();
        let encoded = key.to_hex();

        assert_eq!(encoded.len(), 32);
        assert!(encoded.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_generated_keys_differ() {
        let k1 = SecretKey::generate(DEFAULT_KEY_SIZE).unwrap();
        let k2 = SecretKey::generate(DEFAULT_KEY_SIZE).unwrap();
        assert_ne!(k1.as_bytes(), k2.as_bytes(), "random keys must differ");
    }

    #[test]
    fn test_generate_zero_rejected() {
        assert!(matches!(
            SecretKey::generate(0),
            Err(CryptoError::Construction(_))
        ));
    }

    #[test]
    fn test_hex_roundtrip() {
        let key = SecretKey::from_hex("00ff10Ab").unwrap();
        assert_eq!(key.as_bytes(), &[0x00, 0xff, 0x10, 0xab]);
        assert_eq!(key.to_hex(), "00ff10ab");
    }

    #[test]
    fn test_invalid_hex_does_not_echo_input() {
        let err = SecretKey::from_hex("not-a-key-zzzz").unwrap_err();

        assert!(matches!(err, CryptoError::Construction(_)));
        assert!(!err.to_string().contains("zzzz"));
    }

    #[test]
    fn test_odd_length_hex_rejected() {
        assert!(SecretKey::from_hex("abc").is_err());
    }

    #[test]
    fn test_debug_redacted() {
        let key = SecretKey::from_hex("deadbeef").unwrap();
        let rendered = format!("{key:?}");
        assert!(rendered.contains("REDACTED"));
        assert!(!rendered.contains("deadbeef"));
    }
}
