//! voxclone - 参考音频克隆 + 文本合成服务
//!
//! 架构设计: Hexagonal Architecture
//!
//! 应用层 (application/):
//! - Ports: 端口定义（VoiceProvider, ScratchStorage）
//! - Services: VoiceCloningClient, SynthesisClient
//! - Commands: SynthesizeHandler 流水线
//! - Auth: 共享密钥校验
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: POST /synthesize, GET /ping
//! - Adapters: ElevenLabs 客户端, 临时文件存储

pub mod application;
pub mod config;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
