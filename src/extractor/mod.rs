//! 媒体解析/下载协作方
//!
//! 对外只暴露一个能力：给定 URL 与选项，返回视频信息或执行下载并回调进度。
//! - `types.rs`: yt-dlp 信息 JSON 模型与响应结构
//! - `ytdlp.rs`: 基于 yt-dlp 子进程的实现

mod types;
mod ytdlp;

pub use types::{CombinedVideoInfo, FormatDescriptor, RawFormat, VideoInfo, VideoMetadata};
pub use ytdlp::{parse_output_line, OutputLine, YtDlpExtractor};

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// 解析器错误
#[derive(Debug, Error)]
pub enum ExtractorError {
    /// 无法启动解析进程
    #[error("failed to start yt-dlp ({path:?}): {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid yt-dlp output: {0}")]
    Json(#[from] serde_json::Error),
    /// 进程以非零状态退出，message 为 stderr 的最后一条有效内容
    #[error("{message}")]
    Process { code: i32, message: String },
}

/// 下载过程中的进度事件
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Downloading {
        filename: Option<String>,
        downloaded_bytes: Option<u64>,
        total_bytes: Option<u64>,
    },
    Finished {
        filename: Option<String>,
    },
    Error {
        message: String,
    },
}

/// 进度回调，在下载开始前注册
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// 下载选项
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadOptions {
    pub url: String,
    /// 格式选择表达式，如 `137+bestaudio`
    pub format: String,
    /// 输出模板，如 `downloads/%(title)s.%(ext)s`
    pub output_template: String,
    /// 是否同时写出 PNG 缩略图
    pub write_thumbnail: bool,
}

/// 媒体解析器
#[async_trait]
pub trait MediaExtractor: Send + Sync {
    /// 仅获取视频信息，不下载；无结果时返回 `None`
    async fn extract_info(&self, url: &str) -> Result<Option<VideoInfo>, ExtractorError>;

    /// 执行下载，过程中通过 `on_progress` 上报进度；返回下载后的视频信息
    async fn download(
        &self,
        options: &DownloadOptions,
        on_progress: ProgressCallback,
    ) -> Result<Option<VideoInfo>, ExtractorError>;
}
