use std::path::PathBuf;

use cbk_core::ErrorKind;
use cbk_crypto::CryptoError;
use cbk_storage::StoreError;
use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// The stage of an operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Local file or caller stream I/O
    Local,
    Cipher,
    Store,
    Orchestration,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Stage::Local => "local",
            Stage::Cipher => "cipher",
            Stage::Store => "store",
            Stage::Orchestration => "orchestration",
        })
    }
}

/// Errors from pipeline operations.
///
/// The inner error is kept as the `source`, so callers can inspect
/// [`PipelineError::kind`] without string matching.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("reading local file {}", path.display())]
    LocalRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("writing local file {}", path.display())]
    LocalWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("reading source stream")]
    StreamRead(#[source] std::io::Error),

    #[error("writing destination stream")]
    StreamWrite(#[source] std::io::Error),

    #[error("cipher stage")]
    Cipher(#[from] CryptoError),

    #[error("store stage")]
    Store(#[from] StoreError),

    #[error("operation cancelled")]
    Cancelled,
}

impl PipelineError {
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::LocalRead { .. }
            | PipelineError::LocalWrite { .. }
            | PipelineError::StreamRead(_)
            | PipelineError::StreamWrite(_) => Stage::Local,
            PipelineError::Cipher(_) => Stage::Cipher,
            PipelineError::Store(_) => Stage::Store,
            PipelineError::Cancelled => Stage::Orchestration,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::LocalRead { source, .. } | PipelineError::LocalWrite { source, .. }
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                ErrorKind::NotFound
            }
            PipelineError::LocalRead { .. }
            | PipelineError::LocalWrite { .. }
            | PipelineError::StreamRead(_)
            | PipelineError::StreamWrite(_) => ErrorKind::Io,
            PipelineError::Cipher(e) => e.kind(),
            PipelineError::Store(e) => e.kind(),
            PipelineError::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// True when decryption rejected the object: wrong key or tampered bytes.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(self, PipelineError::Cipher(CryptoError::Authentication))
    }
}
