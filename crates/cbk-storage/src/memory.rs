//! In-memory store, used by tests and `--storage memory`
//!
//! Objects live in a flat map keyed by their normalized path (`a/b/c`).
//! Directories are implied by key prefixes and never stored on their own.

use std::collections::BTreeMap;
use std::io;

use cbk_core::{FileEntry, Metadata};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::path::{join, names_reserved, object_segments, segments};
use crate::{ensure_active, unix_now, ObjectStore};

#[derive(Debug, Clone)]
struct MemObject {
    data: Vec<u8>,
    metadata: Metadata,
    mod_time: i64,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: RwLock<BTreeMap<String, MemObject>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

fn key_of(segs: &[&str]) -> String {
    segs.join("/")
}

fn io_error(op: &'static str, path: &str, kind: io::ErrorKind) -> StoreError {
    StoreError::Io {
        op,
        path: path.to_string(),
        source: io::Error::from(kind),
    }
}

impl ObjectStore for MemoryStore {
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
        let segs = object_segments(path)?;
        let key = key_of(&segs);

        let mut buf = Vec::new();
        data.read_to_end(&mut buf)
            .await
            .map_err(StoreError::io("reading data", path))?;

        let mut objects = self.objects.write().await;

        // An ancestor stored as an object cannot also be a directory
        for depth in 1..segs.len() {
            if objects.contains_key(&key_of(&segs[..depth])) {
                return Err(io_error("creating directory", path, io::ErrorKind::NotADirectory));
            }
        }
        let dir_prefix = format!("{key}/");
        if objects
            .range(dir_prefix.clone()..)
            .next()
            .is_some_and(|(k, _)| k.starts_with(&dir_prefix))
        {
            return Err(io_error("creating file", path, io::ErrorKind::IsADirectory));
        }

        ensure_active(ctx)?;
        let bytes = buf.len();
        objects.insert(
            key,
            MemObject {
                data: buf,
                metadata: metadata.clone(),
                mod_time: unix_now(),
            },
        );

        debug!(path, bytes, metadata_keys = metadata.len(), "stored object in memory");
        Ok(())
    }

    async fn download<W>(&self, ctx: &CancellationToken, path: &str, mut dst: W) -> StoreResult<u64>
    where
        W: AsyncWrite + Unpin + Send,
    {
        ensure_active(ctx)?;
        let key = key_of(&object_segments(path)?);

        let data = {
            let objects = self.objects.read().await;
            objects
                .get(&key)
                .map(|obj| obj.data.clone())
                .ok_or_else(|| StoreError::NotFound(path.to_string()))?
        };

        dst.write_all(&data)
            .await
            .map_err(StoreError::io("writing data", path))?;
        dst.flush()
            .await
            .map_err(StoreError::io("writing data", path))?;

        ensure_active(ctx)?;
        Ok(data.len() as u64)
    }

    async fn delete(&self, ctx: &CancellationToken, path: &str) -> StoreResult<()> {
        ensure_active(ctx)?;
        let key = key_of(&object_segments(path)?);

        self.objects
            .write()
            .await
            .remove(&key)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }

    async fn list(&self, ctx: &CancellationToken, path: &str) -> StoreResult<Vec<FileEntry>> {
        ensure_active(ctx)?;
        let key = key_of(&segments(path)?);
        let objects = self.objects.read().await;

        if !key.is_empty() && objects.contains_key(&key) {
            return Err(io_error("reading directory", path, io::ErrorKind::NotADirectory));
        }

        let prefix = if key.is_empty() {
            String::new()
        } else {
            format!("{key}/")
        };

        let mut children: BTreeMap<String, FileEntry> = BTreeMap::new();
        for (k, obj) in objects.range(prefix.clone()..) {
            let Some(rest) = k.strip_prefix(&prefix) else {
                break;
            };
            match rest.split_once('/') {
                None => {
                    children.insert(
                        rest.to_string(),
                        FileEntry {
                            path: join(path, rest),
                            size: obj.data.len() as u64,
                            is_dir: false,
                            mod_time: obj.mod_time,
                            metadata: obj.metadata.clone(),
                        },
                    );
                }
                Some((dir, _)) => {
                    let entry = children.entry(dir.to_string()).or_insert_with(|| FileEntry {
                        path: join(path, dir),
                        size: 0,
                        is_dir: true,
                        mod_time: obj.mod_time,
                        metadata: Metadata::new(),
                    });
                    entry.mod_time = entry.mod_time.max(obj.mod_time);
                }
            }
        }

        if !key.is_empty() && children.is_empty() {
            return Err(StoreError::NotFound(path.to_string()));
        }

        Ok(children.into_values().collect())
    }

    async fn exists(&self, ctx: &CancellationToken, path: &str) -> StoreResult<bool> {
        ensure_active(ctx)?;
        if names_reserved(path) {
            return Ok(false);
        }

        let key = key_of(&segments(path)?);
        if key.is_empty() {
            return Ok(true);
        }

        let objects = self.objects.read().await;
        if objects.contains_key(&key) {
            return Ok(true);
        }
        let prefix = format!("{key}/");
        Ok(objects
            .range(prefix.clone()..)
            .next()
            .is_some_and(|(k, _)| k.starts_with(&prefix)))
    }

    async fn get_metadata(&self, ctx: &CancellationToken, path: &str) -> StoreResult<Metadata> {
        ensure_active(ctx)?;
        let key = key_of(&object_segments(path)?);
        let objects = self.objects.read().await;

        if let Some(obj) = objects.get(&key) {
            return Ok(obj.metadata.clone());
        }

        let prefix = format!("{key}/");
        let is_dir = objects
            .range(prefix.clone()..)
            .next()
            .is_some_and(|(k, _)| k.starts_with(&prefix));
        if is_dir {
            Ok(Metadata::new())
        } else {
            Err(StoreError::NotFound(path.to_string()))
        }
    }
}
