use thiserror::Error;

/// Coarse classification shared by every cryptobackup error type.
///
/// Callers branch on this instead of matching each crate's enum: a
/// `NotFound` listing is an empty directory, an `Io` listing is broken
/// storage, and an `Authentication` failure must never be retried with the
/// same inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad key size or encoding, unsupported algorithm or backend, invalid path
    Construction,
    /// Filesystem or backend failure
    Io,
    /// Missing object or hierarchy node
    NotFound,
    /// Integrity tag did not verify (tampered data or wrong key)
    Authentication,
    /// Malformed ciphertext framing or metadata document
    Format,
    /// The execution context was cancelled between I/O steps
    Cancelled,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::Construction => "construction",
            ErrorKind::Io => "io",
            ErrorKind::NotFound => "not found",
            ErrorKind::Authentication => "authentication",
            ErrorKind::Format => "format",
            ErrorKind::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// A configuration tag (algorithm or storage backend name) that is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported {what}: {value:?}")]
pub struct UnknownTag {
    pub what: &'static str,
    pub value: String,
}
