use std::path::Path;
use tracing::info;
use ytdlp_job_server::{
    config::{AppConfig, LogConfig, DEFAULT_CONFIG_PATH},
    logging, server, AppState,
};

/// 加载日志配置
///
/// 日志系统尚未初始化，读取失败时静默使用默认配置
async fn load_log_config(path: &Path) -> LogConfig {
    AppConfig::load_from_file(path)
        .await
        .map(|config| config.log)
        .unwrap_or_default()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = Path::new(DEFAULT_CONFIG_PATH);

    // 先初始化日志系统（必须保持 _log_guard 存活）
    let log_config = load_log_config(config_path).await;
    let _log_guard = logging::init_logging(&log_config);

    info!("{} v{} 启动中...", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load_or_default(config_path).await;
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!(
        "下载目录: {:?}, yt-dlp: {:?}",
        config.download.download_dir, config.download.ytdlp_path
    );

    let app_state = AppState::new(config);
    info!("应用状态初始化完成");

    let app = server::build_router(app_state);

    info!("服务器启动在: http://{}", addr);
    info!("WebSocket: ws://{}/ws/download_status", addr);
    info!("健康检查: http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    // 使用 select! 监听关闭信号
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("服务器错误: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("收到 Ctrl+C，正在关闭...");
        }
    }

    info!("服务器已关闭");
    Ok(())
}
