use serde::{Deserialize, Serialize};

/// 下载任务状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// 已派发，等待工作任务上报进度
    Queued,
    /// 下载中
    Downloading,
    /// 已完成
    Finished,
    /// 失败
    Error,
}

impl JobStatus {
    /// 是否为终态（finished / error）
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Finished | JobStatus::Error)
    }
}

/// 下载任务记录
///
/// 每次状态迁移都整体替换记录，因此不属于当前状态的字段总是 `None`。
/// 所有字段都会序列化，缺省值输出为 `null`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadJob {
    pub status: JobStatus,
    pub percent: Option<f64>,
    pub filename: Option<String>,
    pub downloaded_bytes: Option<u64>,
    pub total_bytes: Option<u64>,
    pub error: Option<String>,
    pub thumbnail: Option<String>,
    pub thumbnail_error: Option<String>,
}

impl DownloadJob {
    fn with_status(status: JobStatus) -> Self {
        Self {
            status,
            percent: None,
            filename: None,
            downloaded_bytes: None,
            total_bytes: None,
            error: None,
            thumbnail: None,
            thumbnail_error: None,
        }
    }

    /// 刚派发的任务
    pub fn queued() -> Self {
        Self::with_status(JobStatus::Queued)
    }

    /// 下载中，`percent` 由字节数计算
    pub fn downloading(
        filename: Option<String>,
        downloaded_bytes: Option<u64>,
        total_bytes: Option<u64>,
    ) -> Self {
        Self {
            percent: compute_percent(downloaded_bytes, total_bytes),
            filename,
            downloaded_bytes,
            total_bytes,
            ..Self::with_status(JobStatus::Downloading)
        }
    }

    /// 下载完成
    pub fn finished(filename: Option<String>) -> Self {
        Self {
            filename,
            ..Self::with_status(JobStatus::Finished)
        }
    }

    /// 下载失败
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::with_status(JobStatus::Error)
        }
    }
}

/// 计算进度百分比
///
/// 总大小未知或为 0 时返回 `None`，不做任何猜测
pub fn compute_percent(downloaded_bytes: Option<u64>, total_bytes: Option<u64>) -> Option<f64> {
    match total_bytes {
        Some(total) if total > 0 => {
            let downloaded = downloaded_bytes.unwrap_or(0);
            Some(downloaded as f64 / total as f64 * 100.0)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_percent_calculation() {
        assert_eq!(compute_percent(Some(50), Some(200)), Some(25.0));
        assert_eq!(compute_percent(Some(200), Some(200)), Some(100.0));
        assert_eq!(compute_percent(None, Some(200)), Some(0.0));
    }

    #[test]
    fn test_percent_absent_without_total() {
        assert_eq!(compute_percent(Some(50), None), None);
        assert_eq!(compute_percent(Some(50), Some(0)), None);
        assert_eq!(compute_percent(None, None), None);
    }

    #[test]
    fn test_downloading_record() {
        let job = DownloadJob::downloading(Some("downloads/a.mp4".to_string()), Some(50), Some(200));
        assert_eq!(job.status, JobStatus::Downloading);
        assert_eq!(job.percent, Some(25.0));
        assert_eq!(job.downloaded_bytes, Some(50));
        assert_eq!(job.total_bytes, Some(200));
        assert!(job.error.is_none());
    }

    #[test]
    fn test_terminal_records_carry_no_progress_fields() {
        let finished = DownloadJob::finished(Some("a.mp4".to_string()));
        assert_eq!(finished.status, JobStatus::Finished);
        assert!(finished.percent.is_none());
        assert!(finished.downloaded_bytes.is_none());
        assert!(finished.total_bytes.is_none());

        let failed = DownloadJob::failed("Unsupported URL");
        assert_eq!(failed.status, JobStatus::Error);
        assert_eq!(failed.error.as_deref(), Some("Unsupported URL"));
        assert!(failed.filename.is_none());
    }

    #[test]
    fn test_status_terminal() {
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Downloading.is_terminal());
        assert!(JobStatus::Finished.is_terminal());
        assert!(JobStatus::Error.is_terminal());
    }

    #[test]
    fn test_serialization_keeps_null_fields() {
        let json = serde_json::to_value(DownloadJob::queued()).unwrap();
        assert_eq!(json["status"], "queued");
        assert!(json["percent"].is_null());
        assert!(json.as_object().unwrap().contains_key("thumbnail_error"));
    }

    proptest! {
        #[test]
        fn prop_percent_within_bounds(total in 1u64..1_000_000_000_000u64, ratio in 0.0f64..=1.0) {
            let downloaded = (total as f64 * ratio) as u64;
            let percent = compute_percent(Some(downloaded), Some(total)).unwrap();
            prop_assert!((0.0..=100.0).contains(&percent));
        }
    }
}
