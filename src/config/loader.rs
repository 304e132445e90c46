//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 兼容环境变量（`ELEVENLABS_API_KEY`、`BACKEND_ACCESS_KEY`、`MAX_REF_BYTES`）
//! 2. 环境变量（前缀 `VOXCLONE_`）
//! 3. 配置文件（config.toml）
//! 4. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 兼容的扁平环境变量
#[derive(Debug, Clone, Default)]
pub struct LegacyEnv {
    pub provider_api_key: Option<String>,
    pub access_key: Option<String>,
    pub max_ref_bytes: Option<String>,
}

impl LegacyEnv {
    /// 从进程环境读取
    pub fn from_process() -> Self {
        Self {
            provider_api_key: std::env::var("ELEVENLABS_API_KEY").ok(),
            access_key: std::env::var("BACKEND_ACCESS_KEY").ok(),
            max_ref_bytes: std::env::var("MAX_REF_BYTES").ok(),
        }
    }
}

/// 加载应用配置
///
/// # 环境变量示例
/// - `ELEVENLABS_API_KEY=sk_...`
/// - `BACKEND_ACCESS_KEY=long-random-string`
/// - `MAX_REF_BYTES=5242880`
/// - `VOXCLONE_SERVER__PORT=8080`
/// - `VOXCLONE_PROVIDER__TIMEOUT_SECS=60`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    build_config(config_path, &LegacyEnv::from_process())
}

fn build_config(config_path: Option<&Path>, legacy: &LegacyEnv) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8000)?
        .set_default("provider.base_url", "https://api.elevenlabs.io")?
        .set_default("provider.model_id", "eleven_multilingual_v2")?
        .set_default("provider.output_format", "mp3_44100_128")?
        .set_default("provider.timeout_secs", 120)?
        .set_default("provider.delete_cloned_voice", true)?
        .set_default("limits.max_ref_bytes", 10 * 1024 * 1024)?
        .set_default("limits.max_text_bytes", 1024 * 1024)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量
    // 例如: VOXCLONE_PROVIDER__BASE_URL=https://api.elevenlabs.io
    builder = builder.add_source(
        Environment::with_prefix("VOXCLONE")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    // 4. 兼容环境变量（最高优先级）
    builder = builder
        .set_override_option("provider.api_key", legacy.provider_api_key.clone())?
        .set_override_option("auth.access_key", legacy.access_key.clone())?
        .set_override_option("limits.max_ref_bytes", legacy.max_ref_bytes.clone())?;

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.provider.api_key.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "ELEVENLABS_API_KEY is not set".to_string(),
        ));
    }

    if config.auth.access_key.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "BACKEND_ACCESS_KEY is not set".to_string(),
        ));
    }

    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.provider.base_url.is_empty() {
        return Err(ConfigError::ValidationError(
            "Provider base URL cannot be empty".to_string(),
        ));
    }

    if config.limits.max_ref_bytes == 0 {
        return Err(ConfigError::ValidationError(
            "max_ref_bytes must be greater than 0".to_string(),
        ));
    }

    if config.limits.max_text_bytes == 0 {
        return Err(ConfigError::ValidationError(
            "max_text_bytes must be greater than 0".to_string(),
        ));
    }

    if config.provider.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "Provider timeout cannot be 0".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志），密钥只输出是否已设置
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    tracing::info!("Provider URL: {}", config.provider.base_url);
    tracing::info!("Provider Model: {}", config.provider.model_id);
    tracing::info!("Output Format: {}", config.provider.output_format);
    tracing::info!("Provider Timeout: {}s", config.provider.timeout_secs);
    tracing::info!("Delete Cloned Voice: {}", config.provider.delete_cloned_voice);
    tracing::info!("Provider API Key: {}", mask(&config.provider.api_key));
    tracing::info!("Access Key: {}", mask(&config.auth.access_key));
    tracing::info!("Max Reference Size: {} bytes", config.limits.max_ref_bytes);
    tracing::info!("Max Text Size: {} bytes", config.limits.max_text_bytes);
    tracing::info!("Scratch Directory: {:?}", config.storage.scratch_dir());
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

fn mask(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<unset>"
    } else {
        "<set>"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn valid_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.provider.api_key = "sk_test".to_string();
        config.auth.access_key = "secret".to_string();
        config
    }

    fn legacy_with_keys() -> LegacyEnv {
        LegacyEnv {
            provider_api_key: Some("sk_test".to_string()),
            access_key: Some("secret".to_string()),
            max_ref_bytes: None,
        }
    }

    fn write_config_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_validation_passes_for_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_validation_error_for_missing_api_key() {
        let mut config = valid_config();
        config.provider.api_key = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_missing_access_key() {
        let mut config = valid_config();
        config.auth.access_key = "   ".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_port() {
        let mut config = valid_config();
        config.server.port = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_limit() {
        let mut config = valid_config();
        config.limits.max_ref_bytes = 0;
        assert!(validate_config(&config).is_err());

        let mut config = valid_config();
        config.limits.max_text_bytes = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_text_limit_from_config_file() {
        let file = write_config_file("[limits]\nmax_text_bytes = 4096\n");
        let config = build_config(Some(file.path()), &legacy_with_keys()).unwrap();
        assert_eq!(config.limits.max_text_bytes, 4096);
        assert_eq!(config.limits.max_ref_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn test_legacy_env_supplies_secrets_and_limit() {
        let file = write_config_file("[server]\nport = 9000\n");
        let legacy = LegacyEnv {
            max_ref_bytes: Some("2048".to_string()),
            ..legacy_with_keys()
        };

        let config = build_config(Some(file.path()), &legacy).unwrap();
        assert_eq!(config.provider.api_key, "sk_test");
        assert_eq!(config.auth.access_key, "secret");
        assert_eq!(config.limits.max_ref_bytes, 2048);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.provider.model_id, "eleven_multilingual_v2");
    }

    #[test]
    fn test_legacy_env_overrides_config_file() {
        let file = write_config_file("[auth]\naccess_key = \"from-file\"\n");
        let config = build_config(Some(file.path()), &legacy_with_keys()).unwrap();
        assert_eq!(config.auth.access_key, "secret");
    }

    #[test]
    fn test_missing_secrets_fail_to_load() {
        let file = write_config_file("");
        let result = build_config(Some(file.path()), &LegacyEnv::default());
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_invalid_max_ref_bytes_is_rejected() {
        let file = write_config_file("");
        let legacy = LegacyEnv {
            max_ref_bytes: Some("ten megabytes".to_string()),
            ..legacy_with_keys()
        };
        assert!(build_config(Some(file.path()), &legacy).is_err());
    }
}
