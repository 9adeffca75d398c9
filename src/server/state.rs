// 应用状态

use crate::config::AppConfig;
use crate::downloader::DownloadManager;
use crate::extractor::{MediaExtractor, YtDlpExtractor};
use crate::jobs::JobRegistry;
use std::sync::Arc;

/// 应用全局状态
#[derive(Clone)]
pub struct AppState {
    /// 应用配置
    pub config: Arc<AppConfig>,
    /// 下载任务注册表（工作任务、状态查询与 WebSocket 共享）
    pub registry: Arc<JobRegistry>,
    /// 媒体解析器
    pub extractor: Arc<dyn MediaExtractor>,
    /// 下载管理器
    pub download_manager: Arc<DownloadManager>,
}

impl AppState {
    /// 使用 yt-dlp 子进程解析器创建应用状态
    pub fn new(config: AppConfig) -> Self {
        let extractor = YtDlpExtractor::new(config.download.ytdlp_path.clone())
            .with_extra_args(config.download.ytdlp_args.clone());
        Self::with_extractor(config, Arc::new(extractor))
    }

    /// 使用指定解析器创建应用状态
    pub fn with_extractor(config: AppConfig, extractor: Arc<dyn MediaExtractor>) -> Self {
        let registry = Arc::new(JobRegistry::new());
        let download_manager = Arc::new(DownloadManager::new(
            Arc::clone(&registry),
            Arc::clone(&extractor),
            config.download.download_dir.clone(),
            config.download.grace_period(),
        ));

        Self {
            config: Arc::new(config),
            registry,
            extractor,
            download_manager,
        }
    }
}
