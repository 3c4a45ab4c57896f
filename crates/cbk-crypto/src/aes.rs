//! AES-GCM authenticated encryption over whole streams
//!
//! The entire plaintext is sealed under a single tag with no associated
//! data. A fresh random nonce is drawn for every `encrypt` call and stored
//! in front of the sealed blob; reusing a nonce under the same key would
//! void both confidentiality and integrity.

use std::io::{Read, Write};

use aes_gcm::{
    aead::{consts::U12, Aead, KeyInit},
    aes::Aes192,
    Aes128Gcm, Aes256Gcm, AesGcm, Nonce,
};
use cbk_core::{meta_keys, Metadata};
use rand::RngCore;
use tracing::debug;

use crate::error::{CryptoError, CryptoResult};
use crate::{Cipher, AES_KEY_SIZES, NONCE_SIZE};

type Aes192Gcm = AesGcm<Aes192, U12>;

/// Key schedule for the selected key strength.
enum Sealer {
    Aes128(Aes128Gcm),
    Aes192(Aes192Gcm),
    Aes256(Aes256Gcm),
}

/// AES-GCM cipher with a 128, 192 or 256-bit key.
pub struct AesGcmCipher {
    sealer: Sealer,
    key_bits: usize,
}

impl AesGcmCipher {
    /// Build a cipher from a raw key of 16, 24 or 32 bytes.
    pub fn new(key: &[u8]) -> CryptoResult<Self> {
        let bad_key = |_| CryptoError::Construction("AES key schedule rejected the key".into());
        let sealer = match key.len() {
            16 => Sealer::Aes128(Aes128Gcm::new_from_slice(key).map_err(bad_key)?),
            24 => Sealer::Aes192(Aes192Gcm::new_from_slice(key).map_err(bad_key)?),
            32 => Sealer::Aes256(Aes256Gcm::new_from_slice(key).map_err(bad_key)?),
            n => {
                return Err(CryptoError::Construction(format!(
                    "invalid key size: {n} bytes, must be one of {AES_KEY_SIZES:?}"
                )))
            }
        };

        Ok(Self {
            sealer,
            key_bits: key.len() * 8,
        })
    }

    pub fn key_bits(&self) -> usize {
        self.key_bits
    }

    fn seal(&self, nonce: &Nonce<U12>, plaintext: &[u8]) -> Result<Vec<u8>, aes_gcm::Error> {
        match &self.sealer {
            Sealer::Aes128(c) => c.encrypt(nonce, plaintext),
            Sealer::Aes192(c) => c.encrypt(nonce, plaintext),
            Sealer::Aes256(c) => c.encrypt(nonce, plaintext),
        }
    }

    fn open(&self, nonce: &Nonce<U12>, sealed: &[u8]) -> Result<Vec<u8>, aes_gcm::Error> {
        match &self.sealer {
            Sealer::Aes128(c) => c.decrypt(nonce, sealed),
            Sealer::Aes192(c) => c.decrypt(nonce, sealed),
            Sealer::Aes256(c) => c.decrypt(nonce, sealed),
        }
    }
}

impl Cipher for AesGcmCipher {
    fn encrypt<R: Read, W: Write>(&self, mut src: R, mut dst: W) -> CryptoResult<()> {
        let mut plaintext = Vec::new();
        src.read_to_end(&mut plaintext)
            .map_err(CryptoError::Read)?;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::<U12>::from_slice(&nonce_bytes);

        let sealed = self
            .seal(nonce, &plaintext)
            .map_err(|_| CryptoError::Construction("AES-GCM sealing failed".into()))?;

        dst.write_all(&nonce_bytes).map_err(CryptoError::Write)?;
        dst.write_all(&sealed).map_err(CryptoError::Write)?;
        dst.flush().map_err(CryptoError::Write)?;

        debug!(
            key_bits = self.key_bits,
            plaintext_bytes = plaintext.len(),
            ciphertext_bytes = NONCE_SIZE + sealed.len(),
            "aes-gcm encrypted"
        );
        Ok(())
    }

    fn decrypt<R: Read, W: Write>(&self, mut src: R, mut dst: W) -> CryptoResult<()> {
        let mut blob = Vec::new();
        src.read_to_end(&mut blob).map_err(CryptoError::Read)?;

        if blob.len() < NONCE_SIZE {
            return Err(CryptoError::Format(format!(
                "ciphertext too short: {} bytes (minimum {NONCE_SIZE})",
                blob.len()
            )));
        }

        let (nonce_bytes, sealed) = blob.split_at(NONCE_SIZE);
        let nonce = Nonce::<U12>::from_slice(nonce_bytes);

        // Nothing reaches `dst` unless the tag over the whole blob verifies.
        let plaintext = self
            .open(nonce, sealed)
            .map_err(|_| CryptoError::Authentication)?;

        dst.write_all(&plaintext).map_err(CryptoError::Write)?;
        dst.flush().map_err(CryptoError::Write)?;

        debug!(
            key_bits = self.key_bits,
            plaintext_bytes = plaintext.len(),
            "aes-gcm decrypted"
        );
        Ok(())
    }

    fn describe(&self) -> Metadata {
        Metadata::from([
            (meta_keys::ALGORITHM.to_string(), "AES-GCM".to_string()),
            (meta_keys::KEY_SIZE.to_string(), self.key_bits.to_string()),
        ])
    }
}

impl std::fmt::Debug for AesGcmCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AesGcmCipher")
            .field("key_bits", &self.key_bits)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TAG_SIZE;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn key(len: usize, fill: u8) -> Vec<u8> {
        vec![fill; len]
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let cipher = AesGcmCipher::new(&key(32, 7)).unwrap();
        let plaintext = b"hello, encrypted backup!";

        let encrypted = cipher.encrypt_bytes(plaintext).unwrap();
        let decrypted = cipher.decrypt_bytes(&encrypted).unwrap();

        assert_eq!(&decrypted, plaintext);
    }

    #[test]
    fn test_encrypt_decrypt_empty() {
        let cipher = AesGcmCipher::new(&key(16, 1)).unwrap();

        let encrypted = cipher.encrypt_bytes(b"").unwrap();
        assert_eq!(encrypted.len(), NONCE_SIZE + TAG_SIZE);

        let decrypted = cipher.decrypt_bytes(&encrypted).unwrap();
        assert!(decrypted.is_empty());
    }

    #[test]
    fn test_all_key_sizes_accepted() {
        for len in AES_KEY_SIZES {
            let cipher = AesGcmCipher::new(&key(len, 3)).unwrap();
            assert_eq!(cipher.key_bits(), len * 8);

            let encrypted = cipher.encrypt_bytes(b"payload").unwrap();
            assert_eq!(cipher.decrypt_bytes(&encrypted).unwrap(), b"payload");
        }
    }

    #[test]
    fn test_invalid_key_sizes_rejected() {
        for len in [0, 1, 8, 15, 17, 23, 25, 31, 33, 64] {
            let err = AesGcmCipher::new(&key(len, 3)).unwrap_err();
            assert!(
                matches!(err, CryptoError::Construction(_)),
                "key of {len} bytes must be a construction error, got {err:?}"
            );
            assert_eq!(err.kind(), cbk_core::ErrorKind::Construction);
        }
    }

    #[test]
    fn test_encrypted_size() {
        let cipher = AesGcmCipher::new(&key(16, 9)).unwrap();

        let encrypted = cipher.encrypt_bytes(b"hello test").unwrap();

        // nonce (12) + plaintext (10) + tag (16) = 38
        assert_eq!(encrypted.len(), 38);
    }

    #[test]
    fn test_nonce_unique_per_call() {
        let cipher = AesGcmCipher::new(&key(32, 5)).unwrap();
        let mut nonces = HashSet::new();
        let mut blobs = HashSet::new();

        for _ in 0..1000 {
            let encrypted = cipher.encrypt_bytes(b"same plaintext every time").unwrap();
            assert!(
                nonces.insert(encrypted[..NONCE_SIZE].to_vec()),
                "nonce repeated under the same key"
            );
            blobs.insert(encrypted);
        }
        assert_eq!(blobs.len(), 1000);
    }

    #[test]
    fn test_decrypt_wrong_key() {
        let cipher1 = AesGcmCipher::new(&key(32, 1)).unwrap();
        let cipher2 = AesGcmCipher::new(&key(32, 2)).unwrap();

        let encrypted = cipher1.encrypt_bytes(b"secret data").unwrap();
        let err = cipher2.decrypt_bytes(&encrypted).unwrap_err();

        assert!(matches!(err, CryptoError::Authentication));
    }

    #[test]
    fn test_decrypt_wrong_key_strength() {
        let cipher128 = AesGcmCipher::new(&key(16, 1)).unwrap();
        let cipher256 = AesGcmCipher::new(&key(32, 1)).unwrap();

        let encrypted = cipher128.encrypt_bytes(b"secret data").unwrap();
        let err = cipher256.decrypt_bytes(&encrypted).unwrap_err();

        assert!(matches!(err, CryptoError::Authentication));
    }

    #[test]
    fn test_every_bit_flip_detected() {
        let cipher = AesGcmCipher::new(&key(24, 4)).unwrap();
        let encrypted = cipher.encrypt_bytes(b"hello test").unwrap();

        for byte in 0..encrypted.len() {
            for bit in 0..8 {
                let mut tampered = encrypted.clone();
                tampered[byte] ^= 1 << bit;

                let mut out = Vec::new();
                let err = cipher.decrypt(tampered.as_slice(), &mut out).unwrap_err();
                assert!(
                    matches!(err, CryptoError::Authentication),
                    "flip at byte {byte} bit {bit} must fail authentication"
                );
                assert!(out.is_empty(), "no plaintext may be released on failure");
            }
        }
    }

    #[test]
    fn test_truncated_below_nonce_is_format_error() {
        let cipher = AesGcmCipher::new(&key(32, 6)).unwrap();

        for len in 0..NONCE_SIZE {
            let err = cipher.decrypt_bytes(&vec![0u8; len]).unwrap_err();
            assert!(matches!(err, CryptoError::Format(_)), "len {len}: {err:?}");
        }
    }

    #[test]
    fn test_truncated_tag_fails_authentication() {
        let cipher = AesGcmCipher::new(&key(32, 6)).unwrap();
        let encrypted = cipher.encrypt_bytes(b"some data").unwrap();

        let err = cipher
            .decrypt_bytes(&encrypted[..NONCE_SIZE + 4])
            .unwrap_err();
        assert!(matches!(err, CryptoError::Authentication));
    }

    #[test]
    fn test_describe() {
        let meta = AesGcmCipher::new(&key(24, 0)).unwrap().describe();

        assert_eq!(meta.get("algorithm").map(String::as_str), Some("AES-GCM"));
        assert_eq!(meta.get("key_size").map(String::as_str), Some("192"));
    }

    #[test]
    fn test_debug_redacts_key() {
        let cipher = AesGcmCipher::new(&key(16, 0xAB)).unwrap();
        let rendered = format!("{cipher:?}");

        assert!(rendered.contains("REDACTED"));
        assert!(!rendered.to_lowercase().contains("abab"));
    }

    proptest! {
        #[test]
        fn roundtrip_any_plaintext(
            data in proptest::collection::vec(any::<u8>(), 0..=8192),
            key_idx in 0usize..3,
            fill in any::<u8>(),
        ) {
            let cipher = AesGcmCipher::new(&key(AES_KEY_SIZES[key_idx], fill)).unwrap();
            let encrypted = cipher.encrypt_bytes(&data).unwrap();
            prop_assert_eq!(encrypted.len(), data.len() + NONCE_SIZE + TAG_SIZE);
            prop_assert_eq!(cipher.decrypt_bytes(&encrypted).unwrap(), data);
        }
    }
}
