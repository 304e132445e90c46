//! Synthesize Handler
//!
//! POST /synthesize
//! Header: X-API-KEY（由中间件校验）
//! Form fields:
//!   - ref_audio: 参考音频文件（wav/mp3/ogg...）
//!   - text: 要合成的文本
//! Returns: audio/mpeg，Content-Disposition: attachment; filename="tts.mp3"

use axum::{
    body::Body,
    extract::{
        multipart::{Field, MultipartRejection},
        Multipart, State,
    },
    http::{header, StatusCode},
    response::Response,
};
use futures_util::{Stream, StreamExt, TryStreamExt};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio_util::io::ReaderStream;
use tracing::Instrument;
use uuid::Uuid;

use crate::application::{CleanupScope, PersistReference, ScratchFile, Synthesize};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

const REFERENCE_FIELD: &str = "ref_audio";
const TEXT_FIELD: &str = "text";
const OUTPUT_FILE_NAME: &str = "tts.mp3";

/// 克隆参考音频的音色并合成文本
pub async fn synthesize(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let multipart = multipart.map_err(|e| {
        ApiError::BadRequest(format!("Invalid multipart request: {}", e.body_text()))
    })?;
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("synthesize", request_id = %request_id);

    run_pipeline(state, multipart).instrument(span).await
}

async fn run_pipeline(state: Arc<AppState>, mut multipart: Multipart) -> Result<Response, ApiError> {
    let handler = &state.synthesize_handler;
    let mut reference: Option<ScratchFile> = None;
    let mut text: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ApiError::BadRequest(format!("Failed to read multipart field: {}", e))
    })? {
        let field_name = field.name().unwrap_or_default().to_string();

        match field_name.as_str() {
            REFERENCE_FIELD => {
                let file_name = field.file_name().map(|s| s.to_string());
                let upload = field
                    .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))
                    .boxed();

                // 重复的 ref_audio 字段以最后一个为准，之前的文件随 drop 删除
                reference = Some(
                    handler
                        .persist_reference(PersistReference { file_name, upload })
                        .await?,
                );
            }
            TEXT_FIELD => {
                text = Some(read_text(field, handler.max_text_bytes()).await?);
            }
            _ => {}
        }
    }

    let reference = reference
        .ok_or_else(|| ApiError::BadRequest("ref_audio file is required".to_string()))?;
    let text = text
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("text is required".to_string()))?;

    let result = handler.handle(Synthesize { reference, text }).await?;

    let file = tokio::fs::File::open(&result.audio_path)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to open synthesized audio: {}", e)))?;

    tracing::info!(
        voice_id = %result.voice_id,
        clone_name = %result.clone_name,
        audio_size = result.audio_bytes,
        "Synthesis completed, streaming response"
    );
    tracing::debug!(
        files = ?result.cleanup.paths(),
        "Scratch files held until the response body is dropped"
    );

    // 响应体持有临时文件，发送完毕或连接中断时删除
    let stream = CleanupOnDrop {
        inner: ReaderStream::new(file),
        _cleanup: result.cleanup,
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "audio/mpeg")
        .header(header::CONTENT_LENGTH, result.audio_bytes)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", OUTPUT_FILE_NAME),
        )
        .body(Body::from_stream(stream))
        .map_err(|e| ApiError::Internal(format!("Failed to build response: {}", e)))
}

/// 按块读取 `text` 字段，超过 `limit` 字节时立即停止
async fn read_text(mut field: Field<'_>, limit: u64) -> Result<String, ApiError> {
    let mut buffer: Vec<u8> = Vec::new();

    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read text: {}", e)))?
    {
        if (buffer.len() + chunk.len()) as u64 > limit {
            tracing::warn!(limit, "Text field too large");
            return Err(ApiError::BadRequest("Text field too large".to_string()));
        }
        buffer.extend_from_slice(&chunk);
    }

    String::from_utf8(buffer)
        .map_err(|_| ApiError::BadRequest("text must be valid UTF-8".to_string()))
}

/// 包装响应流，drop 时释放 CleanupScope
struct CleanupOnDrop<S> {
    inner: S,
    _cleanup: CleanupScope,
}

impl<S: Stream + Unpin> Stream for CleanupOnDrop<S> {
    type Item = S::Item;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<S::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
