//! Synthesize Commands - 克隆并合成

use std::path::PathBuf;

use crate::application::ports::{ByteStream, CleanupScope, ScratchFile};

/// 将上传的参考音频落盘
pub struct PersistReference<'a> {
    /// 上传时声明的文件名，用于推断扩展名
    pub file_name: Option<String>,
    /// 上传内容
    pub upload: ByteStream<'a>,
}

/// 用参考音频克隆音色并合成文本
#[derive(Debug)]
pub struct Synthesize {
    pub reference: ScratchFile,
    pub text: String,
}

/// 合成结果
///
/// `cleanup` 持有本次请求的全部临时文件，drop 时删除
#[derive(Debug)]
pub struct SynthesizeResponse {
    pub audio_path: PathBuf,
    pub audio_bytes: u64,
    pub voice_id: String,
    pub clone_name: String,
    pub cleanup: CleanupScope,
}
