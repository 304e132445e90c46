//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（VoiceProvider、ScratchStorage）
//! - services: 服务商调用封装（克隆、合成）
//! - commands: 合成命令及处理器
//! - auth: 访问密钥校验
//! - error: 应用层错误定义

pub mod auth;
pub mod commands;
pub mod error;
pub mod ports;
pub mod services;

pub use auth::AccessGate;
pub use commands::{
    handlers::{PipelineSettings, SynthesizeHandler},
    PersistReference, Synthesize, SynthesizeResponse,
};
pub use error::ApplicationError;
pub use ports::{
    AudioChunkStream, ByteStream, CleanupScope, ProviderError, ReferenceSample, ScratchFile,
    ScratchStoragePort, SpeechRequest, StorageError, VoiceHandle, VoiceProviderPort,
};
pub use services::{SynthesisClient, SynthesisProfile, VoiceCloningClient, MIN_OUTPUT_BYTES};
