//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod scratch_storage;
mod voice_provider;

pub use scratch_storage::{
    ByteStream, CleanupScope, ScratchFile, ScratchStoragePort, StorageError,
};
pub use voice_provider::{
    mime_for_extension, AudioChunkStream, ProviderError, ReferenceSample, SpeechRequest,
    VoiceHandle, VoiceProviderPort,
};
