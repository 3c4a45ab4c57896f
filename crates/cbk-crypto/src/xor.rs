//! Repeating-key XOR stream cipher
//!
//! Kept as a second, trivially inspectable implementation of [`Cipher`].
//! It provides no integrity protection: decrypting with the wrong key
//! silently yields garbage instead of an error.

use std::io::{ErrorKind, Read, Write};

use cbk_core::{meta_keys, Metadata};
use zeroize::Zeroizing;

use crate::error::{CryptoError, CryptoResult};
use crate::Cipher;

/// Bytes processed per read
const CHUNK_SIZE: usize = 4096;

pub struct XorCipher {
    key: Zeroizing<Vec<u8>>,
}

impl XorCipher {
    /// Build a cipher from a non-empty key of any length.
    pub fn new(key: &[u8]) -> CryptoResult<Self> {
        if key.is_empty() {
            return Err(CryptoError::Construction("key cannot be empty".into()));
        }
        Ok(Self {
            key: Zeroizing::new(key.to_vec()),
        })
    }

    /// XOR `src` into `dst`, cycling the key across chunk boundaries.
    fn apply<R: Read, W: Write>(&self, mut src: R, mut dst: W) -> CryptoResult<()> {
        let key_len = self.key.len();
        let mut buf = [0u8; CHUNK_SIZE];
        // Key position carries over between chunks.
        let mut pos = 0usize;

        loop {
            let n = match src.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(CryptoError::Read(e)),
            };

            for byte in &mut buf[..n] {
                *byte ^= self.key[pos];
                pos = (pos + 1) % key_len;
            }

            dst.write_all(&buf[..n]).map_err(CryptoError::Write)?;
        }

        dst.flush().map_err(CryptoError::Write)
    }
}

impl Cipher for XorCipher {
    fn encrypt<R: Read, W: Write>(&self, src: R, dst: W) -> CryptoResult<()> {
        self.apply(src, dst)
    }

    fn decrypt<R: Read, W: Write>(&self, src: R, dst: W) -> CryptoResult<()> {
        self.apply(src, dst)
    }

    fn describe(&self) -> Metadata {
        Metadata::from([
            (meta_keys::ALGORITHM.to_string(), "XOR".to_string()),
            (meta_keys::KEY_SIZE.to_string(), self.key.len().to_string()),
        ])
    }
}

impl std::fmt::Debug for XorCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XorCipher")
            .field("key_len", &self.key.len())
            .field("key", &"[REDACTED]")
            .finish()
    }
}
