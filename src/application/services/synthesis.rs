//! Synthesis Client
//!
//! 调用服务商流式合成，将音频分块按到达顺序写入临时文件

use futures_util::{StreamExt, TryStreamExt};
use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{
    ScratchFile, ScratchStoragePort, SpeechRequest, StorageError, VoiceProviderPort,
};

/// 合成结果的最小合理大小（字节），低于此值视为空结果
pub const MIN_OUTPUT_BYTES: u64 = 100;

/// 固定的合成参数
#[derive(Debug, Clone)]
pub struct SynthesisProfile {
    pub model_id: String,
    pub output_format: String,
}

impl Default for SynthesisProfile {
    fn default() -> Self {
        Self {
            model_id: "eleven_multilingual_v2".to_string(),
            output_format: "mp3_44100_128".to_string(),
        }
    }
}

pub struct SynthesisClient {
    provider: Arc<dyn VoiceProviderPort>,
    storage: Arc<dyn ScratchStoragePort>,
    profile: SynthesisProfile,
}

impl SynthesisClient {
    pub fn new(
        provider: Arc<dyn VoiceProviderPort>,
        storage: Arc<dyn ScratchStoragePort>,
        profile: SynthesisProfile,
    ) -> Self {
        Self {
            provider,
            storage,
            profile,
        }
    }

    /// 合成文本到 `output`，返回写入的字节数
    pub async fn synthesize(
        &self,
        voice_id: &str,
        text: &str,
        output: &ScratchFile,
    ) -> Result<u64, ApplicationError> {
        let request = SpeechRequest {
            voice_id: voice_id.to_string(),
            text: text.to_string(),
            model_id: self.profile.model_id.clone(),
            output_format: self.profile.output_format.clone(),
        };

        tracing::debug!(
            voice_id = %voice_id,
            text_len = text.len(),
            model_id = %request.model_id,
            output_format = %request.output_format,
            "Requesting speech"
        );

        let chunks = self.provider.stream_speech(request).await?;
        let source = chunks
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))
            .boxed();

        let written = self
            .storage
            .write_stream(output, source, None)
            .await
            .map_err(|e| match e {
                StorageError::SourceError(msg) => ApplicationError::ProviderError(msg),
                StorageError::IoError(msg) => ApplicationError::internal(format!(
                    "Failed to write synthesized audio: {}",
                    msg
                )),
            })?;

        // 文件可能已被外部删除，以磁盘上的实际大小为准
        let size = self.storage.size_of(output).await.unwrap_or(0);
        if size < MIN_OUTPUT_BYTES {
            tracing::warn!(voice_id = %voice_id, written, size, "Synthesized audio too small");
            return Err(ApplicationError::SynthesisEmpty { bytes: size });
        }

        tracing::info!(voice_id = %voice_id, bytes = size, "Speech synthesized");

        Ok(size)
    }
}
