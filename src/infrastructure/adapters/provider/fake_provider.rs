//! Fake Voice Provider - 用于测试的服务商
//!
//! 不访问网络，记录所有调用，合成时返回预设的音频分块

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{stream, StreamExt};
use std::sync::{Mutex, MutexGuard};

use crate::application::ports::{
    AudioChunkStream, ProviderError, ReferenceSample, SpeechRequest, VoiceHandle,
    VoiceProviderPort,
};

/// 一次 create_voice 调用的记录
#[derive(Debug, Clone)]
pub struct CreatedVoice {
    pub name: String,
    pub voice_id: String,
    pub sample: ReferenceSample,
}

/// Fake Voice Provider
pub struct FakeVoiceProvider {
    speech_chunks: Vec<Bytes>,
    clone_failure: Option<ProviderError>,
    speech_failure: Option<ProviderError>,
    delete_failure: Option<ProviderError>,
    created: Mutex<Vec<CreatedVoice>>,
    speech_requests: Mutex<Vec<SpeechRequest>>,
    deleted: Mutex<Vec<String>>,
}

impl Default for FakeVoiceProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeVoiceProvider {
    pub fn new() -> Self {
        let audio = Bytes::from(Self::default_audio());
        let speech_chunks = vec![
            audio.slice(..256),
            audio.slice(256..700),
            audio.slice(700..),
        ];

        Self {
            speech_chunks,
            clone_failure: None,
            speech_failure: None,
            delete_failure: None,
            created: Mutex::new(Vec::new()),
            speech_requests: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
        }
    }

    /// 默认合成结果：1 KiB 的伪 MP3 数据
    pub fn default_audio() -> Vec<u8> {
        let mut audio = b"ID3\x04\x00\x00\x00\x00\x00\x00".to_vec();
        audio.extend((0..1014u32).map(|i| (i % 251) as u8));
        audio
    }

    /// 合成时按顺序返回这些分块
    pub fn with_speech_chunks(mut self, chunks: Vec<Bytes>) -> Self {
        self.speech_chunks = chunks;
        self
    }

    /// create_voice 总是返回该错误
    pub fn failing_clone(mut self, error: ProviderError) -> Self {
        self.clone_failure = Some(error);
        self
    }

    /// 返回全部分块之后以该错误结束流
    pub fn failing_speech_after_chunks(mut self, error: ProviderError) -> Self {
        self.speech_failure = Some(error);
        self
    }

    /// delete_voice 记录调用后返回该错误
    pub fn failing_delete(mut self, error: ProviderError) -> Self {
        self.delete_failure = Some(error);
        self
    }

    pub fn created_voices(&self) -> Vec<CreatedVoice> {
        lock(&self.created).clone()
    }

    pub fn speech_requests(&self) -> Vec<SpeechRequest> {
        lock(&self.speech_requests).clone()
    }

    pub fn deleted_voices(&self) -> Vec<String> {
        lock(&self.deleted).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

#[async_trait]
impl VoiceProviderPort for FakeVoiceProvider {
    async fn create_voice(
        &self,
        name: &str,
        sample: ReferenceSample,
    ) -> Result<VoiceHandle, ProviderError> {
        if let Some(error) = &self.clone_failure {
            return Err(error.clone());
        }

        let voice_id = format!("fake-{}", uuid::Uuid::new_v4());
        tracing::debug!(name = %name, voice_id = %voice_id, "FakeVoiceProvider: voice created");

        lock(&self.created).push(CreatedVoice {
            name: name.to_string(),
            voice_id: voice_id.clone(),
            sample,
        });

        Ok(VoiceHandle {
            voice_id,
            requires_verification: false,
        })
    }

    async fn stream_speech(&self, request: SpeechRequest) -> Result<AudioChunkStream, ProviderError> {
        lock(&self.speech_requests).push(request);

        let mut items: Vec<Result<Bytes, ProviderError>> =
            self.speech_chunks.iter().cloned().map(Ok).collect();
        if let Some(error) = &self.speech_failure {
            items.push(Err(error.clone()));
        }

        Ok(stream::iter(items).boxed())
    }

    async fn delete_voice(&self, voice_id: &str) -> Result<(), ProviderError> {
        lock(&self.deleted).push(voice_id.to_string());
        match &self.delete_failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}
