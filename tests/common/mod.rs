#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use ytdlp_job_server::config::AppConfig;
use ytdlp_job_server::extractor::{
    DownloadOptions, ExtractorError, MediaExtractor, ProgressCallback, ProgressEvent, VideoInfo,
};
use ytdlp_job_server::AppState;

/// 回放固定结果的解析器
#[derive(Default)]
pub struct FakeExtractor {
    pub info: Option<VideoInfo>,
    pub fail_with: Option<String>,
    pub events: Vec<ProgressEvent>,
    /// 每个事件之间的停顿
    pub step_delay: Duration,
}

#[async_trait]
impl MediaExtractor for FakeExtractor {
    async fn extract_info(&self, _url: &str) -> Result<Option<VideoInfo>, ExtractorError> {
        match &self.fail_with {
            Some(message) => Err(ExtractorError::Process {
                code: 1,
                message: message.clone(),
            }),
            None => Ok(self.info.clone()),
        }
    }

    async fn download(
        &self,
        _options: &DownloadOptions,
        on_progress: ProgressCallback,
    ) -> Result<Option<VideoInfo>, ExtractorError> {
        for event in &self.events {
            if !self.step_delay.is_zero() {
                tokio::time::sleep(self.step_delay).await;
            }
            on_progress(event.clone());
        }
        match &self.fail_with {
            Some(message) => Err(ExtractorError::Process {
                code: 1,
                message: message.clone(),
            }),
            None => Ok(self.info.clone()),
        }
    }
}

pub fn sample_info() -> VideoInfo {
    serde_json::from_value(serde_json::json!({
        "id": "abc123",
        "title": "Sample Clip",
        "duration": 12.5,
        "uploader": "tester",
        "view_count": 10,
        "thumbnail": "https://img.example.com/abc123.jpg",
        "filesize": null,
        "filesize_approx": 2048,
        "webpage_url": "https://video.example.com/watch?v=abc123",
        "formats": [
            {"format_id": "137", "ext": "mp4", "vcodec": "avc1", "acodec": "none"},
            {"format_id": "140", "ext": "m4a", "vcodec": "none", "acodec": "mp4a", "filesize": 1024}
        ]
    }))
    .unwrap()
}

pub fn test_state(extractor: FakeExtractor, download_dir: &Path) -> AppState {
    let mut config = AppConfig::default();
    config.download.download_dir = download_dir.to_path_buf();
    config.download.status_poll_interval_ms = 20;
    AppState::with_extractor(config, Arc::new(extractor))
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
