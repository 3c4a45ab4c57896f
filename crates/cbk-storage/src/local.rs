//! Local filesystem store
//!
//! Layout under the root directory:
//! ```text
//! <root>/<path>        raw ciphertext bytes
//! <root>/<path>.meta   metadata as a flat JSON object of strings
//! ```
//!
//! Uploads are staged as `.<name>.cbk_tmp` siblings and renamed into place.
//! Listings never show sidecars or staged files.

use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use cbk_core::{FileEntry, Metadata, META_SUFFIX};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::path::{is_reserved_name, join, names_reserved, object_segments, segments, TEMP_SUFFIX};
use crate::{ensure_active, ObjectStore};

#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Open a store rooted at `root`, creating the directory if absent.
    pub fn new(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        if root.as_os_str().is_empty() {
            return Err(StoreError::Config("base path cannot be empty".into()));
        }

        std::fs::create_dir_all(&root).map_err(|source| StoreError::Io {
            op: "creating base directory",
            path: root.display().to_string(),
            source,
        })?;

        Ok(Self { root })
    }

    /// Base directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, segs: &[&str]) -> PathBuf {
        let mut full = self.root.clone();
        full.extend(segs);
        full
    }

    async fn load_metadata(data_path: &Path, logical: &str) -> StoreResult<Metadata> {
        let meta_path = sidecar(data_path);
        match tokio::fs::read(&meta_path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| StoreError::Metadata {
                path: logical.to_string(),
                source,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Metadata::new()),
            Err(source) => Err(StoreError::Io {
                op: "reading metadata",
                path: logical.to_string(),
                source,
            }),
        }
    }
}

/// Sidecar path for a data file: the data path with `.meta` appended.
fn sidecar(data_path: &Path) -> PathBuf {
    let mut s = data_path.as_os_str().to_owned();
    s.push(META_SUFFIX);
    PathBuf::from(s)
}

/// Staging path for `target`, e.g. `dir/.name.cbk_tmp`.
fn staged(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{name}{TEMP_SUFFIX}"))
}

async fn discard(tmp: &Path) {
    match tokio::fs::remove_file(tmp).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(tmp = %tmp.display(), error = %e, "failed to remove staged file"),
    }
}

impl ObjectStore for LocalStore {
    async fn upload<R>(
        &self,
        ctx: &CancellationToken,
        path: &str,
        mut data: R,
        metadata: &Metadata,
    ) -> StoreResult<()>
    where
        R: AsyncRead + Unpin + Send,
    {
        ensure_active(ctx)?;
        let full = self.resolve(&object_segments(path)?);

        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(StoreError::io("creating directory", path))?;
        }

        // Blob and sidecar are staged beside their targets and renamed into
        // place, sidecar first. Only a failed final blob rename can pair the
        // new metadata with the previous blob.
        let blob_tmp = staged(&full);
        let meta_path = sidecar(&full);
        let meta_tmp = staged(&meta_path);

        let result = async {
            let mut file = tokio::fs::File::create(&blob_tmp)
                .await
                .map_err(StoreError::io("creating file", path))?;
            let bytes = tokio::io::copy(&mut data, &mut file)
                .await
                .map_err(StoreError::io("writing data", path))?;
            file.flush()
                .await
                .map_err(StoreError::io("writing data", path))?;
            drop(file);

            ensure_active(ctx)?;

            if metadata.is_empty() {
                // Drop metadata left over from a previous upload to this path
                match tokio::fs::remove_file(&meta_path).await {
                    Ok(()) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(source) => {
                        return Err(StoreError::Io {
                            op: "removing stale metadata",
                            path: path.to_string(),
                            source,
                        })
                    }
                }
            } else {
                let json =
                    serde_json::to_vec(metadata).map_err(|source| StoreError::Metadata {
                        path: path.to_string(),
                        source,
                    })?;
                tokio::fs::write(&meta_tmp, json)
                    .await
                    .map_err(StoreError::io("writing metadata", path))?;
                tokio::fs::rename(&meta_tmp, &meta_path)
                    .await
                    .map_err(StoreError::io("writing metadata", path))?;
            }

            tokio::fs::rename(&blob_tmp, &full)
                .await
                .map_err(StoreError::io("replacing data", path))?;
            Ok::<u64, StoreError>(bytes)
        }
        .await;

        let bytes = match result {
            Ok(bytes) => bytes,
            Err(e) => {
                discard(&blob_tmp).await;
                discard(&meta_tmp).await;
                return Err(e);
            }
        };

        ensure_active(ctx)?;
        debug!(path, bytes, metadata_keys = metadata.len(), "stored object");
        Ok(())
    }

    async fn download<W>(&self, ctx: &CancellationToken, path: &str, mut dst: W) -> StoreResult<u64>
    where
        W: AsyncWrite + Unpin + Send,
    {
        ensure_active(ctx)?;
        let full = self.resolve(&object_segments(path)?);

        let stat = tokio::fs::metadata(&full)
            .await
            .map_err(StoreError::io("opening file", path))?;
        if stat.is_dir() {
            return Err(StoreError::NotFound(path.to_string()));
        }

        let mut file = tokio::fs::File::open(&full)
            .await
            .map_err(StoreError::io("opening file", path))?;
        let bytes = tokio::io::copy(&mut file, &mut dst)
            .await
            .map_err(StoreError::io("reading data", path))?;
        dst.flush()
            .await
            .map_err(StoreError::io("reading data", path))?;

        ensure_active(ctx)?;
        debug!(path, bytes, "read object");
        Ok(bytes)
    }

    async fn delete(&self, ctx: &CancellationToken, path: &str) -> StoreResult<()> {
        ensure_active(ctx)?;
        let full = self.resolve(&object_segments(path)?);

        tokio::fs::remove_file(&full)
            .await
            .map_err(StoreError::io("deleting file", path))?;

        match tokio::fs::remove_file(sidecar(&full)).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path, error = %e, "failed to remove metadata sidecar"),
        }

        debug!(path, "deleted object");
        Ok(())
    }

    async fn list(&self, ctx: &CancellationToken, path: &str) -> StoreResult<Vec<FileEntry>> {
        ensure_active(ctx)?;
        let dir = self.resolve(&segments(path)?);

        let mut reader = tokio::fs::read_dir(&dir)
            .await
            .map_err(StoreError::io("reading directory", path))?;

        let mut entries = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(StoreError::io("reading directory", path))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_reserved_name(&name) {
                continue;
            }

            let stat = match entry.metadata().await {
                Ok(stat) => stat,
                Err(e) => {
                    warn!(path, name = %name, error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            let mod_time = stat
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_secs() as i64)
                .unwrap_or(0);

            let logical = join(path, &name);
            let metadata = match Self::load_metadata(&entry.path(), &logical).await {
                Ok(m) => m,
                Err(e) => {
                    warn!(path = %logical, error = %e, "ignoring unreadable metadata");
                    Metadata::new()
                }
            };

            entries.push(FileEntry {
                path: logical,
                size: if stat.is_dir() { 0 } else { stat.len() },
                is_dir: stat.is_dir(),
                mod_time,
                metadata,
            });
        }

        entries.sort_by(|a, b| a.path.cmp(&b.path));
        ensure_active(ctx)?;
        debug!(path, count = entries.len(), "listed directory");
        Ok(entries)
    }

    async fn exists(&self, ctx: &CancellationToken, path: &str) -> StoreResult<bool> {
        ensure_active(ctx)?;
        if names_reserved(path) {
            return Ok(false);
        }

        match tokio::fs::metadata(self.resolve(&segments(path)?)).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(StoreError::Io {
                op: "checking",
                path: path.to_string(),
                source,
            }),
        }
    }

    async fn get_metadata(&self, ctx: &CancellationToken, path: &str) -> StoreResult<Metadata> {
        ensure_active(ctx)?;
        let full = self.resolve(&object_segments(path)?);

        tokio::fs::metadata(&full)
            .await
            .map_err(StoreError::io("checking", path))?;

        Self::load_metadata(&full, path).await
    }
}
