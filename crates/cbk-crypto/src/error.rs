use cbk_core::ErrorKind;
use thiserror::Error;

pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors from the cipher stage.
///
/// Messages never include key bytes or plaintext.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("cipher construction failed: {0}")]
    Construction(String),

    /// Deliberately carries no detail: a bad tag, a wrong key and corrupted
    /// bytes must be indistinguishable.
    #[error("authentication failed: data was tampered with or the key is wrong")]
    Authentication,

    #[error("malformed ciphertext: {0}")]
    Format(String),

    #[error("reading cipher input")]
    Read(#[source] std::io::Error),

    #[error("writing cipher output")]
    Write(#[source] std::io::Error),
}

impl CryptoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CryptoError::Construction(_) => ErrorKind::Construction,
            CryptoError::Authentication => ErrorKind::Authentication,
            CryptoError::Format(_) => ErrorKind::Format,
            CryptoError::Read(_) | CryptoError::Write(_) => ErrorKind::Io,
        }
    }
}
