//! ElevenLabs Client - 调用 ElevenLabs REST API
//!
//! 实现 VoiceProviderPort trait
//!
//! ElevenLabs API:
//! POST   {base}/v1/voices/add                         multipart: name, files  -> {"voice_id": "..."}
//! POST   {base}/v1/text-to-speech/{voice_id}/stream?output_format=mp3_44100_128
//!        JSON: {"text": "...", "model_id": "..."}      -> audio/mpeg (chunked)
//! DELETE {base}/v1/voices/{voice_id}

use async_trait::async_trait;
use futures_util::{StreamExt, TryStreamExt};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::ports::{
    AudioChunkStream, ProviderError, ReferenceSample, SpeechRequest, VoiceHandle,
    VoiceProviderPort,
};

const XI_API_KEY_HEADER: &str = "xi-api-key";

/// 合成请求体 (JSON)
#[derive(Debug, Serialize)]
struct TextToSpeechBody<'a> {
    text: &'a str,
    model_id: &'a str,
}

/// 创建音色响应
#[derive(Debug, Deserialize)]
struct AddVoiceResponse {
    voice_id: String,
    #[serde(default)]
    requires_verification: bool,
}

/// ElevenLabs 客户端配置
#[derive(Debug, Clone)]
pub struct ElevenLabsClientConfig {
    /// API 基础 URL
    pub base_url: String,
    /// API Key
    pub api_key: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for ElevenLabsClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.elevenlabs.io".to_string(),
            api_key: String::new(),
            timeout_secs: 120,
        }
    }
}

impl ElevenLabsClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// ElevenLabs 客户端
pub struct ElevenLabsClient {
    client: Client,
    config: ElevenLabsClientConfig,
}

impl ElevenLabsClient {
    /// 创建新的客户端
    pub fn new(config: ElevenLabsClientConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    fn add_voice_url(&self) -> String {
        format!("{}/v1/voices/add", self.base_url())
    }

    fn voice_url(&self, voice_id: &str) -> String {
        format!("{}/v1/voices/{}", self.base_url(), voice_id)
    }

    fn speech_url(&self, voice_id: &str) -> String {
        format!("{}/v1/text-to-speech/{}/stream", self.base_url(), voice_id)
    }
}

fn map_send_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout
    } else if e.is_connect() {
        ProviderError::NetworkError(format!("Cannot connect to ElevenLabs: {}", e))
    } else {
        ProviderError::NetworkError(e.to_string())
    }
}

/// 非 2xx 响应转换为 ApiError，保留服务商的错误信息
async fn error_for_status(response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::ApiError {
        status: status.as_u16(),
        detail: extract_detail(&body),
    })
}

/// 提取错误信息
///
/// ElevenLabs 的错误体通常为 `{"detail": {"status": "...", "message": "..."}}`，
/// 校验错误则是 `{"detail": "..."}` 或 `{"detail": [...]}`
fn extract_detail(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.trim().to_string();
    };

    match value.get("detail") {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(detail) => detail
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| detail.to_string()),
        None => body.trim().to_string(),
    }
}

#[async_trait]
impl VoiceProviderPort for ElevenLabsClient {
    async fn create_voice(
        &self,
        name: &str,
        sample: ReferenceSample,
    ) -> Result<VoiceHandle, ProviderError> {
        tracing::debug!(
            url = %self.add_voice_url(),
            name = %name,
            sample_size = sample.data.len(),
            "Sending add voice request"
        );

        let part = Part::bytes(sample.data)
            .file_name(sample.file_name)
            .mime_str(&sample.mime_type)
            .map_err(|e| ProviderError::InvalidResponse(format!("Invalid MIME type: {}", e)))?;
        let form = Form::new().text("name", name.to_string()).part("files", part);

        let response = self
            .client
            .post(self.add_voice_url())
            .header(XI_API_KEY_HEADER, &self.config.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(map_send_error)?;
        let response = error_for_status(response).await?;

        let body: AddVoiceResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse voice: {}", e)))?;

        Ok(VoiceHandle {
            voice_id: body.voice_id,
            requires_verification: body.requires_verification,
        })
    }

    async fn stream_speech(&self, request: SpeechRequest) -> Result<AudioChunkStream, ProviderError> {
        let url = self.speech_url(&request.voice_id);

        tracing::debug!(
            url = %url,
            text_len = request.text.len(),
            output_format = %request.output_format,
            "Sending text-to-speech request"
        );

        let response = self
            .client
            .post(&url)
            .query(&[("output_format", request.output_format.as_str())])
            .header(XI_API_KEY_HEADER, &self.config.api_key)
            .header(reqwest::header::ACCEPT, "audio/mpeg")
            .json(&TextToSpeechBody {
                text: &request.text,
                model_id: &request.model_id,
            })
            .send()
            .await
            .map_err(map_send_error)?;
        let response = error_for_status(response).await?;

        Ok(response.bytes_stream().map_err(map_send_error).boxed())
    }

    async fn delete_voice(&self, voice_id: &str) -> Result<(), ProviderError> {
        let response = self
            .client
            .delete(self.voice_url(voice_id))
            .header(XI_API_KEY_HEADER, &self.config.api_key)
            .send()
            .await
            .map_err(map_send_error)?;
        error_for_status(response).await?;

        Ok(())
    }
}
