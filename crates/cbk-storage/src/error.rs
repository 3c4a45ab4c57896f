use cbk_core::ErrorKind;
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: &'static str },

    #[error("{op} {path}")]
    Io {
        op: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed metadata for {path}")]
    Metadata {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("storage config error: {0}")]
    Config(String),

    #[error("operation cancelled")]
    Cancelled,
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::NotFound(_) => ErrorKind::NotFound,
            StoreError::InvalidPath { .. } | StoreError::Config(_) => ErrorKind::Construction,
            StoreError::Io { .. } => ErrorKind::Io,
            StoreError::Metadata { .. } => ErrorKind::Format,
            StoreError::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Map an I/O error for `path`, promoting `NotFound` to [`StoreError::NotFound`].
    pub(crate) fn io(op: &'static str, path: &str) -> impl FnOnce(std::io::Error) -> StoreError {
        let path = path.to_string();
        move |source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotFound(path)
            } else {
                StoreError::Io { op, path, source }
            }
        }
    }
}
