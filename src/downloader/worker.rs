//! 后台下载工作任务
//!
//! 每个下载对应一个独立的 tokio 任务，把解析器的进度回调翻译为注册表更新。
//! 工作任务是其任务记录的唯一写者；所有失败在任务边界内被捕获并写入记录。

use crate::downloader::DownloadRequest;
use crate::extractor::{
    DownloadOptions, ExtractorError, MediaExtractor, ProgressCallback, ProgressEvent, VideoInfo,
};
use crate::jobs::{DownloadJob, JobRegistry, JobStatus};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// 在宽限期后删除任务记录（非阻塞定时任务）
pub fn schedule_removal(registry: Arc<JobRegistry>, job_id: String, grace_period: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(grace_period).await;
        registry.remove(&job_id);
        debug!("任务记录已过期删除: {}", job_id);
    });
}

/// 单个任务的状态写入器
///
/// 保证只写入一次终态，终态之后的事件全部丢弃
#[derive(Debug)]
pub(crate) struct JobTracker {
    job_id: String,
    registry: Arc<JobRegistry>,
    grace_period: Duration,
    /// 最近一次写入注册表的状态
    status: Mutex<JobStatus>,
}

impl JobTracker {
    pub(crate) fn new(job_id: String, registry: Arc<JobRegistry>, grace_period: Duration) -> Self {
        Self {
            job_id,
            registry,
            grace_period,
            status: Mutex::new(JobStatus::Queued),
        }
    }

    pub(crate) fn job_id(&self) -> &str {
        &self.job_id
    }

    /// 已写入的终态
    pub(crate) fn outcome(&self) -> Option<JobStatus> {
        let status = *self.status.lock().unwrap_or_else(|e| e.into_inner());
        Some(status).filter(JobStatus::is_terminal)
    }

    pub(crate) fn handle(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Downloading {
                filename,
                downloaded_bytes,
                total_bytes,
            } => self.progress(DownloadJob::downloading(filename, downloaded_bytes, total_bytes)),
            ProgressEvent::Finished { filename } => self.finish(filename),
            ProgressEvent::Error { message } => self.fail(message),
        }
    }

    fn progress(&self, job: DownloadJob) {
        // 持锁写入，避免与终态写入交错
        let mut status = self.status.lock().unwrap_or_else(|e| e.into_inner());
        if !status.is_terminal() {
            *status = job.status;
            self.registry.set(&self.job_id, job);
        }
    }

    pub(crate) fn finish(&self, filename: Option<String>) {
        if self.mark_terminal(DownloadJob::finished(filename)) {
            info!("下载完成: {}", self.job_id);
        }
    }

    pub(crate) fn fail(&self, message: impl Into<String>) {
        let message = message.into();
        if self.mark_terminal(DownloadJob::failed(message.clone())) {
            warn!("下载失败: {}, 错误: {}", self.job_id, message);
        }
    }

    fn mark_terminal(&self, job: DownloadJob) -> bool {
        let mut status = self.status.lock().unwrap_or_else(|e| e.into_inner());
        if status.is_terminal() {
            return false;
        }
        *status = job.status;
        self.registry.set(&self.job_id, job);
        schedule_removal(
            Arc::clone(&self.registry),
            self.job_id.clone(),
            self.grace_period,
        );
        true
    }
}

/// 输出文件名清理：去掉路径分隔符，保证文件落在下载目录内
fn sanitize_output_name(name: &str) -> Option<String> {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    match cleaned.as_str() {
        "" | "." | ".." => None,
        _ => Some(cleaned),
    }
}

/// 取出 panic 携带的文本，取不到时退回 JoinError 自身的描述
fn panic_message(err: tokio::task::JoinError) -> String {
    if !err.is_panic() {
        return err.to_string();
    }
    let payload = err.into_panic();
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "task panicked".to_string()
    }
}

/// 后台下载工作任务
pub(crate) struct DownloadWorker {
    pub(crate) request: DownloadRequest,
    pub(crate) download_dir: PathBuf,
    pub(crate) extractor: Arc<dyn MediaExtractor>,
    pub(crate) registry: Arc<JobRegistry>,
    pub(crate) tracker: Arc<JobTracker>,
}

impl DownloadWorker {
    /// 运行到结束，从不向外传播错误
    ///
    /// 下载在内部任务中执行，panic 以 JoinError 的形式在这里被捕获
    pub(crate) async fn run(self) {
        let job_id = self.tracker.job_id().to_string();
        let worker = Arc::new(self);
        let inner = Arc::clone(&worker);

        match tokio::spawn(async move { inner.execute().await }).await {
            Ok(Ok(())) => debug!("下载工作任务结束: {}", job_id),
            Ok(Err(e)) => {
                error!("下载工作任务出错: {}, 错误: {}", job_id, e);
                worker.tracker.fail(e.to_string());
            }
            Err(e) => {
                error!("下载工作任务异常终止: {}, 错误: {}", job_id, e);
                worker.tracker.fail(format!("download worker aborted: {}", panic_message(e)));
            }
        }
    }

    async fn execute(&self) -> Result<(), ExtractorError> {
        tokio::fs::create_dir_all(&self.download_dir).await?;

        let options = self.download_options();
        let tracker = Arc::clone(&self.tracker);
        let on_progress: ProgressCallback = Arc::new(move |event: ProgressEvent| tracker.handle(event));

        let info = self.extractor.download(&options, on_progress).await?;

        // 解析器成功返回但没有上报终态
        let filename = info.as_ref().and_then(|info| info.filepath.clone());
        self.tracker.finish(filename);

        if self.request.include_thumbnail && self.tracker.outcome() == Some(JobStatus::Finished) {
            if let Some(info) = info.as_ref().filter(|info| info.has_thumbnails()) {
                self.attach_thumbnail(info).await;
            }
        }

        Ok(())
    }

    fn output_name(&self) -> Option<String> {
        self.request.name.as_deref().and_then(sanitize_output_name)
    }

    fn download_options(&self) -> DownloadOptions {
        let file_template = match self.output_name() {
            // yt-dlp 模板中的 % 需要转义
            Some(name) => format!("{}.%(ext)s", name.replace('%', "%%")),
            None => "%(title)s.%(ext)s".to_string(),
        };

        DownloadOptions {
            url: self.request.url.clone(),
            format: self.request.format_selector(),
            output_template: self
                .download_dir
                .join(file_template)
                .to_string_lossy()
                .to_string(),
            write_thumbnail: self.request.include_thumbnail,
        }
    }

    /// 缩略图与媒体文件同名，扩展名为 png
    fn thumbnail_path(&self, info: &VideoInfo) -> PathBuf {
        if let Some(filepath) = info.filepath.as_deref() {
            return Path::new(filepath).with_extension("png");
        }

        let base_name = self
            .output_name()
            .or_else(|| info.title.clone())
            .or_else(|| info.id.clone())
            .unwrap_or_else(|| self.tracker.job_id().to_string());
        self.download_dir.join(format!("{}.png", base_name))
    }

    async fn attach_thumbnail(&self, info: &VideoInfo) {
        let path = self.thumbnail_path(info);
        let exists = tokio::fs::try_exists(&path).await.unwrap_or(false);
        let path_str = path.to_string_lossy().to_string();

        self.registry.update(self.tracker.job_id(), |job| {
            if exists {
                job.thumbnail = Some(path_str.clone());
            } else {
                job.thumbnail_error = Some(format!("thumbnail file not found: {}", path_str));
            }
        });

        if exists {
            info!("缩略图已保存: {}", path_str);
        } else {
            warn!("未找到缩略图文件: {}", path_str);
        }
    }
}
