//! cbk-crypto: stream ciphers for cryptobackup
//!
//! Every cipher consumes a whole input stream and produces a self-describing
//! output stream, so the pipeline never needs to store anything besides the
//! ciphertext blob and its metadata.
//!
//! AES-GCM blob format (binary):
//! ```text
//! [12 bytes: random nonce][N bytes: ciphertext][16 bytes: GCM tag]
//! ```
//!
//! The XOR cipher has no framing: output length equals input length and
//! decryption is the same operation as encryption.

pub mod aes;
pub mod backend;
pub mod error;
pub mod key;
pub mod xor;

use std::io::{Read, Write};

use cbk_core::Metadata;

pub use aes::AesGcmCipher;
pub use backend::CipherBackend;
pub use error::{CryptoError, CryptoResult};
pub use key::SecretKey;
pub use xor::XorCipher;

/// Size of an AES-GCM nonce (96-bit)
pub const NONCE_SIZE: usize = 12;

/// Size of a GCM authentication tag
pub const TAG_SIZE: usize = 16;

/// Accepted AES key sizes in bytes (AES-128, AES-192, AES-256)
pub const AES_KEY_SIZES: [usize; 3] = [16, 24, 32];

/// A stream encryption unit.
///
/// Implementations hold nothing but immutable key material, so a single
/// instance may be shared across tasks and used for many streams at once.
pub trait Cipher: Send + Sync {
    /// Consume all of `src` and write the ciphertext to `dst`.
    fn encrypt<R: Read, W: Write>(&self, src: R, dst: W) -> CryptoResult<()>;

    /// Inverse of [`Cipher::encrypt`].
    ///
    /// Authenticated ciphers verify the whole input before writing a single
    /// byte to `dst`.
    fn decrypt<R: Read, W: Write>(&self, src: R, dst: W) -> CryptoResult<()>;

    /// Algorithm identity and effective key strength, merged into object metadata.
    fn describe(&self) -> Metadata;

    /// Encrypt an in-memory buffer.
    fn encrypt_bytes(&self, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
        let mut out = Vec::with_capacity(plaintext.len() + NONCE_SIZE + TAG_SIZE);
        self.encrypt(plaintext, &mut out)?;
        Ok(out)
    }

    /// Decrypt an in-memory buffer.
    fn decrypt_bytes(&self, ciphertext: &[u8]) -> CryptoResult<Vec<u8>> {
        let mut out = Vec::with_capacity(ciphertext.len());
        self.decrypt(ciphertext, &mut out)?;
        Ok(out)
    }
}
