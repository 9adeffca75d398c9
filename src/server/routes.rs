// 路由构建

use crate::server::{handlers, websocket, AppState};
use axum::{http::HeaderValue, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

/// 根据配置的允许源构建 CORS 层，包含 `*` 时放开全部
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.is_empty() || origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("忽略无效的 CORS 源: {}", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

/// 构建完整应用路由
pub fn build_router(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http()) // HTTP 请求日志
        .layer(cors_layer(&state.config.server.cors_origins));

    Router::new()
        // 视频信息
        .route(
            "/metadata",
            get(handlers::get_metadata).post(handlers::get_metadata),
        )
        .route(
            "/thumbnail",
            get(handlers::get_thumbnail).post(handlers::get_thumbnail),
        )
        .route("/size", get(handlers::get_size).post(handlers::get_size))
        .route(
            "/formats",
            get(handlers::get_formats).post(handlers::get_formats),
        )
        .route(
            "/combined_video_info",
            get(handlers::get_combined_video_info).post(handlers::get_combined_video_info),
        )
        // 下载
        .route(
            "/download",
            get(handlers::create_download).post(handlers::create_download),
        )
        .route("/download_status", get(handlers::get_download_status))
        .route(
            "/ws/download_status",
            get(websocket::handle_download_status_ws),
        )
        .route("/health", get(handlers::health_check))
        .layer(middleware)
        .with_state(state)
}
