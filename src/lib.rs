// yt-dlp 下载任务服务核心库

// 配置管理模块
pub mod config;

// 日志模块
pub mod logging;

// 媒体解析模块（yt-dlp 子进程）
pub mod extractor;

// 下载任务状态模块
pub mod jobs;

// 下载引擎模块
pub mod downloader;

// Web服务器模块
pub mod server;

// 导出常用类型
pub use config::AppConfig;
pub use downloader::{DownloadManager, DownloadRequest};
pub use extractor::{MediaExtractor, ProgressEvent, VideoInfo, YtDlpExtractor};
pub use jobs::{DownloadJob, JobRegistry, JobStatus};
pub use server::AppState;
