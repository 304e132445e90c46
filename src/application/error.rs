//! 应用层错误定义
//!
//! 合成流水线各阶段的统一错误类型

use thiserror::Error;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 访问密钥缺失或不匹配
    #[error("Unauthorized")]
    Unauthorized,

    /// 参考音频超过上限
    #[error("Reference file too large")]
    ReferenceTooLarge { size: u64, limit: u64 },

    /// 请求参数错误
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 语音服务商调用失败（保留服务商原始错误信息）
    #[error("{0}")]
    ProviderError(String),

    /// 合成结果为空或过小
    #[error("Synthesized file is empty or too small ({bytes} bytes)")]
    SynthesisEmpty { bytes: u64 },

    /// 本地 I/O 等内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApplicationError {
    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }
}

impl From<crate::application::ports::ProviderError> for ApplicationError {
    fn from(err: crate::application::ports::ProviderError) -> Self {
        Self::ProviderError(err.to_string())
    }
}
