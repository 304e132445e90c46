//! Scratch Storage Port - 请求级临时文件
//!
//! 上传的参考音频与合成结果都落在临时文件中，请求结束后删除。
//! `ScratchFile` 在 drop 时自动删除对应文件，`CleanupScope` 按注册的逆序释放一组文件。

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 临时文件存储错误
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(String),

    /// 数据来源（上传流 / 服务商流）读取失败
    #[error("{0}")]
    SourceError(String),
}

/// 写入临时文件的字节流
pub type ByteStream<'a> = BoxStream<'a, std::io::Result<Bytes>>;

/// 请求级临时文件句柄
///
/// 未显式释放时在 drop 中尽力删除文件，错误只记录日志
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
    armed: bool,
}

impl ScratchFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            armed: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 文件名（不含目录），临时文件名唯一
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// 文件扩展名（不含点）
    pub fn extension(&self) -> Option<&str> {
        self.path.extension().and_then(|e| e.to_str())
    }

    /// 解除自动删除，交出路径
    pub fn into_path(mut self) -> PathBuf {
        self.armed = false;
        std::mem::take(&mut self.path)
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if self.armed {
            remove_quietly(&self.path);
        }
    }
}

/// 尽力删除文件，不存在或无权限时静默
///
/// 在 drop 中同步执行单次 unlink（也可能位于 tokio 工作线程上），
/// drop 返回时文件已不存在，调用方与测试依赖这一点
fn remove_quietly(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "Scratch file removed"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to remove scratch file"),
    }
}

/// 延迟释放的临时文件栈
///
/// drop 时按注册的逆序删除，适用于成功、错误、连接中断等所有退出路径
#[derive(Debug, Default)]
pub struct CleanupScope {
    files: Vec<ScratchFile>,
}

impl CleanupScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册一个在作用域结束时释放的文件
    pub fn defer(&mut self, file: ScratchFile) {
        self.files.push(file);
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| f.path().to_path_buf()).collect()
    }
}

impl Drop for CleanupScope {
    fn drop(&mut self) {
        while let Some(file) = self.files.pop() {
            drop(file);
        }
    }
}

/// Scratch Storage Port
#[async_trait]
pub trait ScratchStoragePort: Send + Sync {
    /// 创建唯一命名的空临时文件
    async fn allocate(&self, prefix: &str, suffix: &str) -> Result<ScratchFile, StorageError>;

    /// 按块将字节流写入文件，返回写入的字节数
    ///
    /// 跳过空块；设置 `limit` 时，写入量超过上限后立即停止读取
    async fn write_stream(
        &self,
        file: &ScratchFile,
        source: ByteStream<'_>,
        limit: Option<u64>,
    ) -> Result<u64, StorageError>;

    /// 当前文件大小，文件不存在时返回错误
    async fn size_of(&self, file: &ScratchFile) -> Result<u64, StorageError>;

    /// 读取整个文件
    async fn read_all(&self, file: &ScratchFile) -> Result<Vec<u8>, StorageError>;

    /// 尽力删除，从不返回错误
    async fn release(&self, file: ScratchFile);
}
