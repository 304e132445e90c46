//! Temp File Store - 文件系统临时文件实现
//!
//! 实现 ScratchStoragePort trait，文件名唯一性由 tempfile 保证

use async_trait::async_trait;
use futures_util::StreamExt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::application::ports::{
    ByteStream, ScratchFile, ScratchStoragePort, StorageError,
};

/// 文件系统临时文件存储
pub struct TempFileStore {
    /// 临时文件目录
    base_dir: PathBuf,
}

impl TempFileStore {
    /// 创建新的临时文件存储
    pub async fn new(base_dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let base_dir = base_dir.as_ref().to_path_buf();

        // 确保目录存在
        fs::create_dir_all(&base_dir)
            .await
            .map_err(|e| StorageError::IoError(e.to_string()))?;

        Ok(Self { base_dir })
    }
}

#[async_trait]
impl ScratchStoragePort for TempFileStore {
    async fn allocate(&self, prefix: &str, suffix: &str) -> Result<ScratchFile, StorageError> {
        let dir = self.base_dir.clone();
        let prefix = prefix.to_string();
        let suffix = suffix.to_string();

        let path = tokio::task::spawn_blocking(move || {
            tempfile::Builder::new()
                .prefix(&prefix)
                .suffix(&suffix)
                .tempfile_in(&dir)
                .and_then(|file| file.keep().map(|(_, path)| path).map_err(|e| e.error))
        })
        .await
        .map_err(|e| StorageError::IoError(e.to_string()))?
        .map_err(|e| StorageError::IoError(e.to_string()))?;

        tracing::debug!(path = %path.display(), "Scratch file allocated");

        Ok(ScratchFile::new(path))
    }

    async fn write_stream(
        &self,
        file: &ScratchFile,
        mut source: ByteStream<'_>,
        limit: Option<u64>,
    ) -> Result<u64, StorageError> {
        let mut out = fs::OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(file.path())
            .await
            .map_err(|e| StorageError::IoError(e.to_string()))?;

        let mut written = 0u64;
        while let Some(chunk) = source.next().await {
            let chunk = chunk.map_err(|e| StorageError::SourceError(e.to_string()))?;
            if chunk.is_empty() {
                continue;
            }

            out.write_all(&chunk)
                .await
                .map_err(|e| StorageError::IoError(e.to_string()))?;
            written += chunk.len() as u64;

            if limit.is_some_and(|limit| written > limit) {
                tracing::debug!(
                    path = %file.path().display(),
                    written,
                    "Write limit exceeded, stop reading source"
                );
                break;
            }
        }

        out.flush()
            .await
            .map_err(|e| StorageError::IoError(e.to_string()))?;

        Ok(written)
    }

    async fn size_of(&self, file: &ScratchFile) -> Result<u64, StorageError> {
        fs::metadata(file.path())
            .await
            .map(|m| m.len())
            .map_err(|e| StorageError::IoError(e.to_string()))
    }

    async fn read_all(&self, file: &ScratchFile) -> Result<Vec<u8>, StorageError> {
        fs::read(file.path())
            .await
            .map_err(|e| StorageError::IoError(e.to_string()))
    }

    async fn release(&self, file: ScratchFile) {
        let path = file.into_path();

        match fs::remove_file(&path).await {
            Ok(()) => tracing::debug!(path = %path.display(), "Scratch file released"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to release scratch file")
            }
        }
    }
}
