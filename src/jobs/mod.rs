//! 下载任务状态模块
//!
//! - `job.rs`: 任务记录与状态
//! - `registry.rs`: 并发任务注册表

mod job;
mod registry;

pub use job::{compute_percent, DownloadJob, JobStatus};
pub use registry::{JobRegistry, JobSnapshot};

use thiserror::Error;

/// 任务注册表错误
#[derive(Debug, Error)]
pub enum JobError {
    #[error("任务已存在: {0}")]
    AlreadyExists(String),
}
