//! cbk-storage: object stores for encrypted blobs and their metadata
//!
//! An object is addressed by a slash-separated logical path and consists of
//! an opaque byte stream plus a string-to-string metadata mapping. Every
//! operation takes a [`CancellationToken`] which is checked before the first
//! I/O step and again after the transfer.

pub mod backend;
pub mod error;
pub mod local;
pub mod memory;
pub mod path;

use cbk_core::{FileEntry, Metadata};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;

pub use backend::{build_store, StoreBackend};
pub use error::{StoreError, StoreResult};
pub use local::LocalStore;
pub use memory::MemoryStore;

/// Persistence contract shared by every backend.
///
/// Concurrent writes to the same path are not coordinated: the last writer
/// observed by the backend wins.
#[allow(async_fn_in_trait)]
pub trait ObjectStore: Send + Sync {
    /// Store `data` at `path`, replacing any existing object and its metadata.
    /// Intermediate hierarchy nodes are created as needed. Paths with any
    /// segment ending in `.meta` or `.cbk_tmp` are rejected.
    async fn upload<R>(
        &self,
        ctx: &CancellationToken,
        path: &str,
        data: R,
        metadata: &Metadata,
    ) -> StoreResult<()>
    where
        R: AsyncRead + Unpin + Send;

    /// Copy the object at `path` into `dst`, returning the number of bytes written.
    async fn download<W>(&self, ctx: &CancellationToken, path: &str, dst: W) -> StoreResult<u64>
    where
        W: AsyncWrite + Unpin + Send;

    /// Remove the object and its metadata. A missing sidecar is not an error.
    async fn delete(&self, ctx: &CancellationToken, path: &str) -> StoreResult<()>;

    /// Immediate children of the hierarchy node at `path`, ordered by name.
    /// Metadata sidecars never appear as entries.
    async fn list(&self, ctx: &CancellationToken, path: &str) -> StoreResult<Vec<FileEntry>>;

    /// `Ok(false)` when nothing exists at `path`.
    async fn exists(&self, ctx: &CancellationToken, path: &str) -> StoreResult<bool>;

    /// Metadata recorded for the object, empty if none was written.
    async fn get_metadata(&self, ctx: &CancellationToken, path: &str) -> StoreResult<Metadata>;
}

/// Fail with [`StoreError::Cancelled`] once the context has been cancelled.
pub(crate) fn ensure_active(ctx: &CancellationToken) -> StoreResult<()> {
    if ctx.is_cancelled() {
        Err(StoreError::Cancelled)
    } else {
        Ok(())
    }
}

/// Current time as Unix seconds.
pub(crate) fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}
