//! Infrastructure Layer - 基础设施层
//!
//! 提供所有端口的具体实现及 HTTP 接口

pub mod adapters;
pub mod http;

pub use adapters::{ElevenLabsClient, ElevenLabsClientConfig, TempFileStore};
pub use http::{AppState, HttpServer, ServerConfig};
