//! Application State
//!
//! 启动时构建一次，之后只读，通过 Arc 在请求之间共享

use std::sync::Arc;

use crate::application::{
    AccessGate, PipelineSettings, ScratchStoragePort, SynthesizeHandler, VoiceProviderPort,
};

/// 应用状态
pub struct AppState {
    pub access_gate: AccessGate,
    pub synthesize_handler: SynthesizeHandler,
}

impl AppState {
    /// 创建应用状态
    pub fn new(
        access_key: impl Into<String>,
        storage: Arc<dyn ScratchStoragePort>,
        provider: Arc<dyn VoiceProviderPort>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            access_gate: AccessGate::new(access_key),
            synthesize_handler: SynthesizeHandler::new(storage, provider, settings),
        }
    }
}
