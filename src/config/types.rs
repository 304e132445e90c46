//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

/// 应用主配置
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 访问控制配置
    #[serde(default)]
    pub auth: AuthConfig,

    /// 语音服务商（ElevenLabs）配置
    #[serde(default)]
    pub provider: ProviderConfig,

    /// 请求限制
    #[serde(default)]
    pub limits: LimitsConfig,

    /// 临时文件存储配置
    #[serde(default)]
    pub storage: StorageConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// 访问控制配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    /// 与请求头 `X-API-KEY` 比对的共享密钥（必填）
    #[serde(default)]
    pub access_key: String,
}

/// 语音服务商配置
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// 服务商 API Key（必填）
    #[serde(default)]
    pub api_key: String,

    /// API 基础 URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// 合成模型
    #[serde(default = "default_model_id")]
    pub model_id: String,

    /// 输出编码格式（采样率_比特率）
    #[serde(default = "default_output_format")]
    pub output_format: String,

    /// 单次调用超时时间（秒）
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// 合成结束后是否删除服务商侧的克隆音色
    #[serde(default = "default_delete_cloned_voice")]
    pub delete_cloned_voice: bool,
}

fn default_base_url() -> String {
    "https://api.elevenlabs.io".to_string()
}

fn default_model_id() -> String {
    "eleven_multilingual_v2".to_string()
}

fn default_output_format() -> String {
    "mp3_44100_128".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_delete_cloned_voice() -> bool {
    true
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            model_id: default_model_id(),
            output_format: default_output_format(),
            timeout_secs: default_timeout_secs(),
            delete_cloned_voice: default_delete_cloned_voice(),
        }
    }
}

/// 请求限制
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// 参考音频最大大小（字节），默认 10MB
    #[serde(default = "default_max_ref_bytes")]
    pub max_ref_bytes: u64,

    /// `text` 字段最大大小（字节），默认 1MB
    #[serde(default = "default_max_text_bytes")]
    pub max_text_bytes: u64,
}

fn default_max_ref_bytes() -> u64 {
    10 * 1024 * 1024 // 10 MB
}

fn default_max_text_bytes() -> u64 {
    1024 * 1024
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_ref_bytes: default_max_ref_bytes(),
            max_text_bytes: default_max_text_bytes(),
        }
    }
}

/// 临时文件存储配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    /// 临时文件目录，未设置时使用系统临时目录
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,
}

impl StorageConfig {
    /// 实际使用的临时目录
    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.provider.base_url, "https://api.elevenlabs.io");
        assert_eq!(config.provider.output_format, "mp3_44100_128");
        assert_eq!(config.limits.max_ref_bytes, 10 * 1024 * 1024);
        assert_eq!(config.limits.max_text_bytes, 1024 * 1024);
        assert!(config.provider.delete_cloned_voice);
    }

    #[test]
    fn test_scratch_dir_falls_back_to_temp_dir() {
        let config = StorageConfig::default();
        assert_eq!(config.scratch_dir(), std::env::temp_dir());

        let config = StorageConfig {
            scratch_dir: Some(PathBuf::from("/var/tmp/voxclone")),
        };
        assert_eq!(config.scratch_dir(), PathBuf::from("/var/tmp/voxclone"));
    }
}
