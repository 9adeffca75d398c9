use crate::downloader::select_format;
use crate::downloader::worker::{DownloadWorker, JobTracker};
use crate::extractor::MediaExtractor;
use crate::jobs::{JobError, JobRegistry};
use serde::{Deserialize, Deserializer};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// 下载请求（POST /download 请求体 / GET 查询参数）
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DownloadRequest {
    pub url: String,
    /// 输出文件名（不含扩展名）
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub include_thumbnail: bool,
    /// 旧版单一格式 ID，未指定 video_format_id 时作为视频格式
    #[serde(default)]
    pub format_id: Option<String>,
    #[serde(default)]
    pub video_format_id: Option<String>,
    #[serde(default)]
    pub audio_format_id: Option<String>,
}

/// 宽松的布尔值：接受 JSON 布尔、0/1 以及 yes/no、on/off 等字符串
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Text(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => Ok(value),
        Flag::Int(0) => Ok(false),
        Flag::Int(1) => Ok(true),
        Flag::Int(other) => Err(serde::de::Error::custom(format!(
            "invalid boolean value: {}",
            other
        ))),
        Flag::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "t" | "yes" | "y" | "on" => Ok(true),
            "0" | "false" | "f" | "no" | "n" | "off" => Ok(false),
            _ => Err(serde::de::Error::custom(format!(
                "invalid boolean value: {}",
                text
            ))),
        },
    }
}

impl DownloadRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// yt-dlp 格式选择表达式
    pub fn format_selector(&self) -> String {
        let video = self
            .video_format_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .or(self.format_id.as_deref());
        select_format(video, self.audio_format_id.as_deref())
    }
}

/// 下载管理器
///
/// 负责分配任务 ID、登记初始记录并启动后台工作任务
pub struct DownloadManager {
    registry: Arc<JobRegistry>,
    extractor: Arc<dyn MediaExtractor>,
    download_dir: PathBuf,
    grace_period: Duration,
}

impl DownloadManager {
    pub fn new(
        registry: Arc<JobRegistry>,
        extractor: Arc<dyn MediaExtractor>,
        download_dir: PathBuf,
        grace_period: Duration,
    ) -> Self {
        Self {
            registry,
            extractor,
            download_dir,
            grace_period,
        }
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    /// 派发下载任务，立即返回任务 ID，不等待下载
    pub fn dispatch(&self, request: DownloadRequest) -> Result<String, JobError> {
        let job_id = uuid::Uuid::new_v4().to_string();
        self.registry.create(&job_id)?;

        info!(
            "创建下载任务: id={}, url={}, format={}",
            job_id,
            request.url,
            request.format_selector()
        );

        let worker = DownloadWorker {
            request,
            download_dir: self.download_dir.clone(),
            extractor: Arc::clone(&self.extractor),
            registry: Arc::clone(&self.registry),
            tracker: Arc::new(JobTracker::new(
                job_id.clone(),
                Arc::clone(&self.registry),
                self.grace_period,
            )),
        };
        tokio::spawn(worker.run());

        Ok(job_id)
    }
}

impl std::fmt::Debug for DownloadManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadManager")
            .field("jobs", &self.registry.len())
            .field("download_dir", &self.download_dir)
            .field("grace_period", &self.grace_period)
            .finish()
    }
}
