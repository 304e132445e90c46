//! Voice Provider Port - 语音克隆 / 合成服务抽象
//!
//! 定义外部服务商的三个调用：创建克隆音色、流式合成、删除音色。
//! 具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use thiserror::Error;

/// 服务商错误
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    /// 服务商返回的非 2xx 响应，`detail` 为服务商的原始错误信息
    #[error("HTTP {status}: {detail}")]
    ApiError { status: u16, detail: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// 用于克隆的参考音频样本
#[derive(Debug, Clone)]
pub struct ReferenceSample {
    /// 上传给服务商时使用的文件名
    pub file_name: String,
    /// MIME 类型
    pub mime_type: String,
    /// 完整音频数据
    pub data: Vec<u8>,
}

/// 服务商分配的克隆音色
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceHandle {
    pub voice_id: String,
    pub requires_verification: bool,
}

/// 合成请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechRequest {
    pub voice_id: String,
    pub text: String,
    pub model_id: String,
    /// 编码格式，如 `mp3_44100_128`
    pub output_format: String,
}

/// 合成音频分块流
///
/// 有限、只能向前、不可重放；分块边界与音频帧边界无关
pub type AudioChunkStream = BoxStream<'static, Result<Bytes, ProviderError>>;

/// Voice Provider Port
#[async_trait]
pub trait VoiceProviderPort: Send + Sync {
    /// 根据参考音频创建克隆音色
    async fn create_voice(
        &self,
        name: &str,
        sample: ReferenceSample,
    ) -> Result<VoiceHandle, ProviderError>;

    /// 发起合成，返回音频分块流
    async fn stream_speech(&self, request: SpeechRequest) -> Result<AudioChunkStream, ProviderError>;

    /// 删除服务商侧的克隆音色
    async fn delete_voice(&self, voice_id: &str) -> Result<(), ProviderError>;
}

/// 根据文件扩展名推断参考音频的 MIME 类型
pub fn mime_for_extension(ext: Option<&str>) -> &'static str {
    match ext.map(|e| e.to_ascii_lowercase()).as_deref() {
        Some("wav") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        Some("flac") => "audio/flac",
        Some("ogg") => "audio/ogg",
        Some("m4a") => "audio/mp4",
        Some("webm") => "audio/webm",
        _ => "application/octet-stream",
    }
}
