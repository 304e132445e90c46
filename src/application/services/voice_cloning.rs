//! Voice Cloning Client
//!
//! 读取参考音频并调用服务商创建克隆音色

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{
    mime_for_extension, ReferenceSample, ScratchFile, ScratchStoragePort, VoiceHandle,
    VoiceProviderPort,
};

pub struct VoiceCloningClient {
    provider: Arc<dyn VoiceProviderPort>,
    storage: Arc<dyn ScratchStoragePort>,
}

impl VoiceCloningClient {
    pub fn new(provider: Arc<dyn VoiceProviderPort>, storage: Arc<dyn ScratchStoragePort>) -> Self {
        Self { provider, storage }
    }

    /// 用参考音频创建克隆音色
    ///
    /// 整个文件读入内存，调用方必须已经校验过大小上限
    pub async fn clone_voice(
        &self,
        display_name: &str,
        reference: &ScratchFile,
    ) -> Result<VoiceHandle, ApplicationError> {
        let data = self.storage.read_all(reference).await.map_err(|e| {
            ApplicationError::internal(format!("Failed to read reference audio: {}", e))
        })?;

        let sample = ReferenceSample {
            file_name: reference.file_name(),
            mime_type: mime_for_extension(reference.extension()).to_string(),
            data,
        };
        let sample_size = sample.data.len();

        let voice = self.provider.create_voice(display_name, sample).await?;

        tracing::info!(
            clone_name = %display_name,
            voice_id = %voice.voice_id,
            sample_size,
            requires_verification = voice.requires_verification,
            "Voice cloned"
        );

        Ok(voice)
    }
}
