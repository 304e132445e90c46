//! voxclone - 参考音频克隆 + 文本合成服务

use std::sync::Arc;

use voxclone::application::{PipelineSettings, SynthesisProfile};
use voxclone::config::{load_config, print_config, AppConfig};
use voxclone::infrastructure::adapters::{ElevenLabsClient, ElevenLabsClientConfig, TempFileStore};
use voxclone::infrastructure::http::{AppState, HttpServer, ServerConfig};

fn init_tracing(config: &AppConfig) {
    let log_filter = format!(
        "{},voxclone={},tower_http=debug",
        config.log.level, config.log.level
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：兼容环境变量 > VOXCLONE_ 环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config);

    tracing::info!("voxclone - voice clone TTS backend");
    print_config(&config);

    let storage = Arc::new(TempFileStore::new(config.storage.scratch_dir()).await?);

    let provider_config = ElevenLabsClientConfig::new(config.provider.api_key.clone())
        .with_base_url(config.provider.base_url.clone())
        .with_timeout(config.provider.timeout_secs);
    let provider = Arc::new(ElevenLabsClient::new(provider_config)?);

    let settings = PipelineSettings {
        max_ref_bytes: config.limits.max_ref_bytes,
        max_text_bytes: config.limits.max_text_bytes,
        profile: SynthesisProfile {
            model_id: config.provider.model_id.clone(),
            output_format: config.provider.output_format.clone(),
        },
        delete_cloned_voice: config.provider.delete_cloned_voice,
    };

    let state = AppState::new(config.auth.access_key.clone(), storage, provider, settings);
    let server_config = ServerConfig::new(&config.server.host, config.server.port);
    let server = HttpServer::new(server_config, state);

    tracing::info!("Starting HTTP server...");

    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
