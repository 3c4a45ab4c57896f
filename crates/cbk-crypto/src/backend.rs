//! Cipher factory keyed by algorithm tag

use std::io::{Read, Write};

use cbk_core::{Algorithm, Metadata};

use crate::aes::AesGcmCipher;
use crate::error::{CryptoError, CryptoResult};
use crate::xor::XorCipher;
use crate::Cipher;

/// Runtime-selected cipher.
#[derive(Debug)]
pub enum CipherBackend {
    Aes(AesGcmCipher),
    Xor(XorCipher),
}

impl CipherBackend {
    /// Build the cipher for `algorithm` from a raw key.
    pub fn new(algorithm: Algorithm, key: &[u8]) -> CryptoResult<Self> {
        match algorithm {
            Algorithm::Aes => Ok(CipherBackend::Aes(AesGcmCipher::new(key)?)),
            Algorithm::Xor => Ok(CipherBackend::Xor(XorCipher::new(key)?)),
        }
    }
}

impl Cipher for CipherBackend {
    fn encrypt<R: Read, W: Write>(&self, src: R, dst: W) -> CryptoResult<()> {
        match self {
            CipherBackend::Aes(c) => c.encrypt(src, dst),
            CipherBackend::Xor(c) => c.encrypt(src, dst),
        }
    }

    fn decrypt<R: Read, W: Write>(&self, src: R, dst: W) -> CryptoResult<()> {
        match self {
            CipherBackend::Aes(c) => c.decrypt(src, dst),
            CipherBackend::Xor(c) => c.decrypt(src, dst),
        }
    }

    fn describe(&self) -> Metadata {
        match self {
            CipherBackend::Aes(c) => c.describe(),
            CipherBackend::Xor(c) => c.describe(),
        }
    }
}
