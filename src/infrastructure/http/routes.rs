//! HTTP Routes
//!
//! API Endpoints:
//! - /ping          GET   健康检查（无需密钥）
//! - /synthesize    POST  上传参考音频 + 文本，返回合成的 MP3（需要 X-API-KEY）

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::middleware::require_access_key;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .merge(synthesize_routes(state))
}

/// 合成路由
///
/// 参考音频大小由流水线在写入时自行限制，这里关闭框架的请求体上限
fn synthesize_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/synthesize", post(handlers::synthesize))
        .layer(DefaultBodyLimit::disable())
        .route_layer(middleware::from_fn_with_state(state, require_access_key))
}
