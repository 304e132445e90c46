//! Access Gate - 共享密钥校验
//!
//! 所有昂贵操作（文件落盘、服务商调用）之前执行

use subtle::ConstantTimeEq;

use crate::application::error::ApplicationError;

/// 单一共享密钥的访问控制
#[derive(Clone)]
pub struct AccessGate {
    secret: String,
}

impl AccessGate {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// 校验调用方提供的密钥，仅在完全相等时通过
    pub fn verify(&self, token: Option<&str>) -> Result<(), ApplicationError> {
        match token {
            Some(token) if secret_matches(token, &self.secret) => Ok(()),
            _ => Err(ApplicationError::Unauthorized),
        }
    }
}

impl std::fmt::Debug for AccessGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGate").finish_non_exhaustive()
    }
}

fn secret_matches(token: &str, secret: &str) -> bool {
    bool::from(token.as_bytes().ct_eq(secret.as_bytes()))
}
