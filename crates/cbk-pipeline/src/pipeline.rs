use std::path::{Path, PathBuf};

use cbk_core::{meta_keys, FileEntry, Metadata};
use cbk_crypto::Cipher;
use cbk_storage::ObjectStore;
use chrono::{SecondsFormat, Utc};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{PipelineError, PipelineResult};

/// Result of an upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReport {
    pub remote_path: String,
    /// Plaintext bytes read from the source
    pub original_size: u64,
    /// Ciphertext bytes handed to the store
    pub encrypted_size: u64,
}

/// Result of a download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadReport {
    pub remote_path: String,
    /// Plaintext bytes delivered
    pub bytes: u64,
}

/// Composes a cipher and an object store.
#[derive(Debug)]
pub struct Pipeline<C, S> {
    cipher: C,
    store: S,
}

fn ensure_active(ctx: &CancellationToken) -> PipelineResult<()> {
    if ctx.is_cancelled() {
        Err(PipelineError::Cancelled)
    } else {
        Ok(())
    }
}

fn upload_time() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Temp sibling used while writing `path`, e.g. `dir/.name.cbk_tmp`.
fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.cbk_tmp"))
}

impl<C: Cipher, S: ObjectStore> Pipeline<C, S> {
    pub fn new(cipher: C, store: S) -> Self {
        Self { cipher, store }
    }

    /// Encrypt the local file at `local_path` and store it at `remote_path`.
    ///
    /// Recorded metadata is the cipher's self-description plus
    /// `original_name`, `original_size`, `encrypted_size` and `upload_time`.
    pub async fn upload_file(
        &self,
        ctx: &CancellationToken,
        local_path: &Path,
        remote_path: &str,
    ) -> PipelineResult<UploadReport> {
        ensure_active(ctx)?;

        let plaintext =
            tokio::fs::read(local_path)
                .await
                .map_err(|source| PipelineError::LocalRead {
                    path: local_path.to_path_buf(),
                    source,
                })?;
        let ciphertext = self.cipher.encrypt_bytes(&plaintext)?;

        let original_name = local_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut metadata = self.cipher.describe();
        metadata.insert(meta_keys::ORIGINAL_NAME.into(), original_name);
        metadata.insert(
            meta_keys::ORIGINAL_SIZE.into(),
            plaintext.len().to_string(),
        );
        metadata.insert(
            meta_keys::ENCRYPTED_SIZE.into(),
            ciphertext.len().to_string(),
        );
        metadata.insert(meta_keys::UPLOAD_TIME.into(), upload_time());

        self.store
            .upload(ctx, remote_path, &ciphertext[..], &metadata)
            .await?;
        ensure_active(ctx)?;

        let report = UploadReport {
            remote_path: remote_path.to_string(),
            original_size: plaintext.len() as u64,
            encrypted_size: ciphertext.len() as u64,
        };
        info!(
            local = %local_path.display(),
            remote = %remote_path,
            original_size = report.original_size,
            encrypted_size = report.encrypted_size,
            "uploaded file"
        );
        Ok(report)
    }

    /// Fetch and decrypt `remote_path` into `local_path`.
    ///
    /// Parent directories are created as needed. The plaintext is written to
    /// a temporary sibling and renamed over `local_path`, so a failed
    /// download never leaves a partial file behind.
    pub async fn download_file(
        &self,
        ctx: &CancellationToken,
        remote_path: &str,
        local_path: &Path,
    ) -> PipelineResult<DownloadReport> {
        ensure_active(ctx)?;

        let plaintext = self.fetch_plaintext(ctx, remote_path).await?;

        let local_err = |source: std::io::Error| PipelineError::LocalWrite {
            path: local_path.to_path_buf(),
            source,
        };

        if let Some(parent) = local_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(local_err)?;
            }
        }

        let tmp = temp_sibling(local_path);
        tokio::fs::write(&tmp, &plaintext).await.map_err(local_err)?;
        if let Err(source) = tokio::fs::rename(&tmp, local_path).await {
            if let Err(e) = tokio::fs::remove_file(&tmp).await {
                warn!(tmp = %tmp.display(), error = %e, "failed to remove temp file");
            }
            return Err(local_err(source));
        }

        info!(
            remote = %remote_path,
            local = %local_path.display(),
            bytes = plaintext.len(),
            "downloaded file"
        );
        Ok(DownloadReport {
            remote_path: remote_path.to_string(),
            bytes: plaintext.len() as u64,
        })
    }

    /// Encrypt everything read from `src` and store it at `remote_path`.
    ///
    /// `metadata` is merged over the cipher's self-description, caller keys
    /// winning on collision. `encrypted_size` and `upload_time` are set last.
    pub async fn upload_stream<R>(
        &self,
        ctx: &CancellationToken,
        mut src: R,
        remote_path: &str,
        metadata: &Metadata,
    ) -> PipelineResult<UploadReport>
    where
        R: AsyncRead + Unpin + Send,
    {
        ensure_active(ctx)?;

        let mut plaintext = Vec::new();
        src.read_to_end(&mut plaintext)
            .await
            .map_err(PipelineError::StreamRead)?;
        let ciphertext = self.cipher.encrypt_bytes(&plaintext)?;

        let mut merged = self.cipher.describe();
        merged.extend(metadata.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged.insert(
            meta_keys::ENCRYPTED_SIZE.into(),
            ciphertext.len().to_string(),
        );
        merged.insert(meta_keys::UPLOAD_TIME.into(), upload_time());

        self.store
            .upload(ctx, remote_path, &ciphertext[..], &merged)
            .await?;
        ensure_active(ctx)?;

        info!(
            remote = %remote_path,
            original_size = plaintext.len(),
            encrypted_size = ciphertext.len(),
            caller_keys = metadata.len(),
            "uploaded stream"
        );
        Ok(UploadReport {
            remote_path: remote_path.to_string(),
            original_size: plaintext.len() as u64,
            encrypted_size: ciphertext.len() as u64,
        })
    }

    /// Fetch and decrypt `remote_path` into `dst`.
    ///
    /// Nothing is written to `dst` unless decryption succeeds.
    pub async fn download_stream<W>(
        &self,
        ctx: &CancellationToken,
        remote_path: &str,
        mut dst: W,
    ) -> PipelineResult<DownloadReport>
    where
        W: AsyncWrite + Unpin + Send,
    {
        ensure_active(ctx)?;

        let plaintext = self.fetch_plaintext(ctx, remote_path).await?;
        dst.write_all(&plaintext)
            .await
            .map_err(PipelineError::StreamWrite)?;
        dst.flush().await.map_err(PipelineError::StreamWrite)?;

        info!(remote = %remote_path, bytes = plaintext.len(), "downloaded stream");
        Ok(DownloadReport {
            remote_path: remote_path.to_string(),
            bytes: plaintext.len() as u64,
        })
    }

    pub async fn list_files(
        &self,
        ctx: &CancellationToken,
        remote_path: &str,
    ) -> PipelineResult<Vec<FileEntry>> {
        ensure_active(ctx)?;
        Ok(self.store.list(ctx, remote_path).await?)
    }

    pub async fn delete_file(&self, ctx: &CancellationToken, remote_path: &str) -> PipelineResult<()> {
        ensure_active(ctx)?;
        self.store.delete(ctx, remote_path).await?;
        info!(remote = %remote_path, "deleted file");
        Ok(())
    }

    /// Recorded metadata for `remote_path`, readable without the key.
    pub async fn get_file_info(
        &self,
        ctx: &CancellationToken,
        remote_path: &str,
    ) -> PipelineResult<Metadata> {
        ensure_active(ctx)?;
        Ok(self.store.get_metadata(ctx, remote_path).await?)
    }

    async fn fetch_plaintext(
        &self,
        ctx: &CancellationToken,
        remote_path: &str,
    ) -> PipelineResult<Vec<u8>> {
        let mut ciphertext = Vec::new();
        self.store.download(ctx, remote_path, &mut ciphertext).await?;
        ensure_active(ctx)?;

        debug!(remote = %remote_path, bytes = ciphertext.len(), "decrypting");
        Ok(self.cipher.decrypt_bytes(&ciphertext)?)
    }
}
