//! Synthesize Command Handlers
//!
//! 流水线：落盘参考音频 → 大小校验 → 克隆音色 → 合成 → (删除远端音色)
//! 访问校验在 HTTP 层完成，早于本处理器的任何调用

use std::path::Path;
use std::sync::Arc;

use crate::application::commands::{PersistReference, Synthesize, SynthesizeResponse};
use crate::application::error::ApplicationError;
use crate::application::ports::{
    CleanupScope, ScratchFile, ScratchStoragePort, VoiceProviderPort,
};
use crate::application::services::{SynthesisClient, SynthesisProfile, VoiceCloningClient};

/// 参考音频默认扩展名
const DEFAULT_REFERENCE_SUFFIX: &str = ".wav";

/// 流水线参数
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// 参考音频最大字节数
    pub max_ref_bytes: u64,
    /// `text` 字段最大字节数
    pub max_text_bytes: u64,
    /// 合成参数
    pub profile: SynthesisProfile,
    /// 合成后删除服务商侧的克隆音色
    pub delete_cloned_voice: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_ref_bytes: 10 * 1024 * 1024,
            max_text_bytes: 1024 * 1024,
            profile: SynthesisProfile::default(),
            delete_cloned_voice: true,
        }
    }
}

/// Synthesize Handler
pub struct SynthesizeHandler {
    storage: Arc<dyn ScratchStoragePort>,
    provider: Arc<dyn VoiceProviderPort>,
    cloning: VoiceCloningClient,
    synthesis: SynthesisClient,
    settings: PipelineSettings,
}

impl SynthesizeHandler {
    pub fn new(
        storage: Arc<dyn ScratchStoragePort>,
        provider: Arc<dyn VoiceProviderPort>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            cloning: VoiceCloningClient::new(provider.clone(), storage.clone()),
            synthesis: SynthesisClient::new(
                provider.clone(),
                storage.clone(),
                settings.profile.clone(),
            ),
            storage,
            provider,
            settings,
        }
    }

    pub fn max_text_bytes(&self) -> u64 {
        self.settings.max_text_bytes
    }

    /// 将上传内容写入 `ref_*` 临时文件并校验大小
    ///
    /// 超过上限时立即删除文件并返回 `ReferenceTooLarge`
    pub async fn persist_reference(
        &self,
        command: PersistReference<'_>,
    ) -> Result<ScratchFile, ApplicationError> {
        let suffix = reference_suffix(command.file_name.as_deref());
        let limit = self.settings.max_ref_bytes;

        let reference = self.storage.allocate("ref_", &suffix).await.map_err(|e| {
            ApplicationError::internal(format!("Failed to save reference: {}", e))
        })?;

        if let Err(e) = self
            .storage
            .write_stream(&reference, command.upload, Some(limit))
            .await
        {
            self.storage.release(reference).await;
            return Err(ApplicationError::internal(format!(
                "Failed to save reference: {}",
                e
            )));
        }

        let size = match self.storage.size_of(&reference).await {
            Ok(size) => size,
            Err(e) => {
                self.storage.release(reference).await;
                return Err(ApplicationError::internal(format!(
                    "Failed to save reference: {}",
                    e
                )));
            }
        };

        if size > limit {
            tracing::warn!(size, limit, "Reference file too large");
            self.storage.release(reference).await;
            return Err(ApplicationError::ReferenceTooLarge { size, limit });
        }

        tracing::debug!(
            path = %reference.path().display(),
            size,
            "Reference audio saved"
        );

        Ok(reference)
    }

    /// 克隆音色并合成文本
    ///
    /// 任一阶段失败时，本次请求的临时文件随局部变量 drop 删除；
    /// 成功时由返回的 `CleanupScope` 接管
    pub async fn handle(&self, command: Synthesize) -> Result<SynthesizeResponse, ApplicationError> {
        let Synthesize { reference, text } = command;

        let output = self.storage.allocate("out_", ".mp3").await.map_err(|e| {
            ApplicationError::internal(format!("Failed to allocate output file: {}", e))
        })?;

        let clone_name = format!("ref_clone_{}", reference.file_name());
        let voice = self.cloning.clone_voice(&clone_name, &reference).await?;

        let synthesized = self
            .synthesis
            .synthesize(&voice.voice_id, &text, &output)
            .await;

        if self.settings.delete_cloned_voice {
            self.delete_remote_voice(&voice.voice_id).await;
        }

        let audio_bytes = synthesized?;
        let audio_path = output.path().to_path_buf();

        let mut cleanup = CleanupScope::new();
        cleanup.defer(reference);
        cleanup.defer(output);

        Ok(SynthesizeResponse {
            audio_path,
            audio_bytes,
            voice_id: voice.voice_id,
            clone_name,
            cleanup,
        })
    }

    async fn delete_remote_voice(&self, voice_id: &str) {
        match self.provider.delete_voice(voice_id).await {
            Ok(()) => tracing::debug!(voice_id = %voice_id, "Cloned voice deleted"),
            Err(e) => {
                tracing::warn!(voice_id = %voice_id, error = %e, "Failed to delete cloned voice")
            }
        }
    }
}

/// 从上传文件名推断临时文件后缀，缺省为 `.wav`
fn reference_suffix(file_name: Option<&str>) -> String {
    file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 8)
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_else(|| DEFAULT_REFERENCE_SUFFIX.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{ByteStream, ProviderError};
    use crate::infrastructure::adapters::{FakeVoiceProvider, TempFileStore};
    use bytes::Bytes;
    use futures_util::{stream, StreamExt};
    use tempfile::{tempdir, TempDir};

    async fn setup(
        provider: FakeVoiceProvider,
        settings: PipelineSettings,
    ) -> (TempDir, Arc<FakeVoiceProvider>, SynthesizeHandler) {
        let temp_dir = tempdir().unwrap();
        let store = Arc::new(TempFileStore::new(temp_dir.path()).await.unwrap());
        let provider = Arc::new(provider);
        let handler = SynthesizeHandler::new(store, provider.clone(), settings);
        (temp_dir, provider, handler)
    }

    fn upload(size: usize) -> ByteStream<'static> {
        let chunks: Vec<std::io::Result<Bytes>> = vec![0u8; size]
            .chunks(64 * 1024)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        stream::iter(chunks).boxed()
    }

    fn entries(dir: &TempDir) -> usize {
        std::fs::read_dir(dir.path()).unwrap().count()
    }

    #[test]
    fn test_reference_suffix() {
        assert_eq!(reference_suffix(Some("voice.MP3")), ".mp3");
        assert_eq!(reference_suffix(Some("sample.ogg")), ".ogg");
        assert_eq!(reference_suffix(Some("noext")), ".wav");
        assert_eq!(reference_suffix(None), ".wav");
        assert_eq!(reference_suffix(Some("weird.wa v")), ".wav");
    }

    #[tokio::test]
    async fn test_persist_reference_within_limit() {
        let (dir, _provider, handler) =
            setup(FakeVoiceProvider::new(), PipelineSettings::default()).await;

        let reference = handler
            .persist_reference(PersistReference {
                file_name: Some("me.ogg".to_string()),
                upload: upload(500 * 1024),
            })
            .await
            .unwrap();

        assert!(reference.file_name().starts_with("ref_"));
        assert_eq!(reference.extension(), Some("ogg"));
        assert_eq!(std::fs::metadata(reference.path()).unwrap().len(), 500 * 1024);
        assert_eq!(entries(&dir), 1);

        drop(reference);
        assert_eq!(entries(&dir), 0);
    }

    #[tokio::test]
    async fn test_persist_reference_too_large_is_released() {
        let settings = PipelineSettings {
            max_ref_bytes: 1024,
            ..Default::default()
        };
        let (dir, _provider, handler) = setup(FakeVoiceProvider::new(), settings).await;

        let err = handler
            .persist_reference(PersistReference {
                file_name: Some("big.wav".to_string()),
                upload: upload(4096),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::ReferenceTooLarge { limit: 1024, .. }));
        assert_eq!(entries(&dir), 0);
    }

    #[tokio::test]
    async fn test_persist_reference_exactly_at_limit_is_accepted() {
        let settings = PipelineSettings {
            max_ref_bytes: 4096,
            ..Default::default()
        };
        let (_dir, _provider, handler) = setup(FakeVoiceProvider::new(), settings).await;

        let reference = handler
            .persist_reference(PersistReference {
                file_name: None,
                upload: upload(4096),
            })
            .await
            .unwrap();
        assert_eq!(reference.extension(), Some("wav"));
    }

    #[tokio::test]
    async fn test_handle_success_hands_files_to_cleanup_scope() {
        let (dir, provider, handler) =
            setup(FakeVoiceProvider::new(), PipelineSettings::default()).await;
        let reference = handler
            .persist_reference(PersistReference {
                file_name: Some("a.wav".to_string()),
                upload: upload(2048),
            })
            .await
            .unwrap();
        let reference_name = reference.file_name();

        let response = handler
            .handle(Synthesize {
                reference,
                text: "hello world".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(response.clone_name, format!("ref_clone_{}", reference_name));
        assert_eq!(response.cleanup.paths().len(), 2);
        assert!(response.audio_path.exists());
        assert_eq!(
            std::fs::read(&response.audio_path).unwrap(),
            FakeVoiceProvider::default_audio()
        );
        assert_eq!(provider.speech_requests()[0].voice_id, response.voice_id);
        assert_eq!(provider.deleted_voices(), vec![response.voice_id.clone()]);

        drop(response);
        assert_eq!(entries(&dir), 0);
    }

    #[tokio::test]
    async fn test_handle_keeps_remote_voice_when_configured() {
        let settings = PipelineSettings {
            delete_cloned_voice: false,
            ..Default::default()
        };
        let (_dir, provider, handler) = setup(FakeVoiceProvider::new(), settings).await;
        let reference = handler
            .persist_reference(PersistReference {
                file_name: None,
                upload: upload(2048),
            })
            .await
            .unwrap();

        handler
            .handle(Synthesize {
                reference,
                text: "hi".to_string(),
            })
            .await
            .unwrap();

        assert!(provider.deleted_voices().is_empty());
    }

    #[tokio::test]
    async fn test_clone_failure_removes_all_files() {
        let provider = FakeVoiceProvider::new().failing_clone(ProviderError::ApiError {
            status: 400,
            detail: "unsupported format".to_string(),
        });
        let (dir, provider, handler) = setup(provider, PipelineSettings::default()).await;
        let reference = handler
            .persist_reference(PersistReference {
                file_name: None,
                upload: upload(2048),
            })
            .await
            .unwrap();

        let err = handler
            .handle(Synthesize {
                reference,
                text: "hi".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::ProviderError(msg) if msg.contains("unsupported format")));
        assert!(provider.speech_requests().is_empty());
        assert_eq!(entries(&dir), 0);
    }

    #[tokio::test]
    async fn test_empty_synthesis_still_deletes_remote_voice() {
        let provider = FakeVoiceProvider::new().with_speech_chunks(vec![Bytes::from_static(b"x")]);
        let (dir, provider, handler) = setup(provider, PipelineSettings::default()).await;
        let reference = handler
            .persist_reference(PersistReference {
                file_name: None,
                upload: upload(2048),
            })
            .await
            .unwrap();

        let err = handler
            .handle(Synthesize {
                reference,
                text: "hi".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::SynthesisEmpty { .. }));
        assert_eq!(provider.deleted_voices().len(), 1);
        assert_eq!(entries(&dir), 0);
    }

    #[tokio::test]
    async fn test_remote_delete_failure_does_not_fail_request() {
        let provider = FakeVoiceProvider::new().failing_delete(ProviderError::ApiError {
            status: 500,
            detail: "voice service unavailable".to_string(),
        });
        let (dir, provider, handler) = setup(provider, PipelineSettings::default()).await;
        let reference = handler
            .persist_reference(PersistReference {
                file_name: None,
                upload: upload(2048),
            })
            .await
            .unwrap();

        let response = handler
            .handle(Synthesize {
                reference,
                text: "hi".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(provider.deleted_voices(), vec![response.voice_id.clone()]);
        assert!(response.audio_path.exists());

        drop(response);
        assert_eq!(entries(&dir), 0);
    }
}
