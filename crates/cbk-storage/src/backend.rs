//! Runtime-selected store backend

use cbk_core::config::{StorageBackendKind, StorageConfig};
use cbk_core::{FileEntry, Metadata};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::StoreResult;
use crate::local::LocalStore;
use crate::memory::MemoryStore;
use crate::ObjectStore;

/// A store chosen from configuration.
///
/// Every operation forwards to the wrapped implementation.
#[derive(Debug)]
pub enum StoreBackend {
    Local(LocalStore),
    Memory(MemoryStore),
}

/// Build the store named by `config`.
pub fn build_store(config: &StorageConfig) -> StoreResult<StoreBackend> {
    match config.backend {
        StorageBackendKind::Local => {
            let store = LocalStore::new(&config.root)?;
            info!(root = %store.root().display(), "opened local store");
            Ok(StoreBackend::Local(store))
        }
        StorageBackendKind::Memory => {
            info!("opened in-memory store");
            Ok(StoreBackend::Memory(MemoryStore::new()))
        }
    }
}

impl ObjectStore for StoreBackend {
    async fn upload<R>(
        &self,
        ctx: &CancellationToken,
        path: &str,
        data: R,
        metadata: &Metadata,
    ) -> StoreResult<()>
    where
        R: AsyncRead + Unpin + Send,
    {
        match self {
            StoreBackend::Local(s) => s.upload(ctx, path, data, metadata).await,
            StoreBackend::Memory(s) => s.upload(ctx, path, data, metadata).await,
        }
    }

    async fn download<W>(&self, ctx: &CancellationToken, path: &str, dst: W) -> StoreResult<u64>
    where
        W: AsyncWrite + Unpin + Send,
    {
        match self {
            StoreBackend::Local(s) => s.download(ctx, path, dst).await,
            StoreBackend::Memory(s) => s.download(ctx, path, dst).await,
        }
    }

    async fn delete(&self, ctx: &CancellationToken, path: &str) -> StoreResult<()> {
        match self {
            StoreBackend::Local(s) => s.delete(ctx, path).await,
            StoreBackend::Memory(s) => s.delete(ctx, path).await,
        }
    }

    async fn list(&self, ctx: &CancellationToken, path: &str) -> StoreResult<Vec<FileEntry>> {
        match self {
            StoreBackend::Local(s) => s.list(ctx, path).await,
            StoreBackend::Memory(s) => s.list(ctx, path).await,
        }
    }

    async fn exists(&self, ctx: &CancellationToken, path: &str) -> StoreResult<bool> {
        match self {
            StoreBackend::Local(s) => s.exists(ctx, path).await,
            StoreBackend::Memory(s) => s.exists(ctx, path).await,
        }
    }

    async fn get_metadata(&self, ctx: &CancellationToken, path: &str) -> StoreResult<Metadata> {
        match self {
            StoreBackend::Local(s) => s.get_metadata(ctx, path).await,
            StoreBackend::Memory(s) => s.get_metadata(ctx, path).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_build_local() {
        let tmp = TempDir::new().unwrap();
        let config = StorageConfig {
            backend: StorageBackendKind::Local,
            root: tmp.path().join("store"),
        };

        let store = build_store(&config).unwrap();
        assert!(matches!(store, StoreBackend::Local(_)));
        assert!(tmp.path().join("store").is_dir());

        let ctx = CancellationToken::new();
        store
            .upload(&ctx, "/f", &b"abc"[..], &Metadata::new())
            .await
            .unwrap();
        assert!(tmp.path().join("store/f").is_file());
    }

    #[tokio::test]
    async fn test_build_memory() {
        let config = StorageConfig {
            backend: StorageBackendKind::Memory,
            ..Default::default()
        };

        let store = build_store(&config).unwrap();
        assert!(matches!(store, StoreBackend::Memory(_)));

        let ctx = CancellationToken::new();
        assert!(store.list(&ctx, "/").await.unwrap().is_empty());
    }
}
