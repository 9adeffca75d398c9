// 下载模块
//
// - format: 格式选择策略
// - manager: 任务派发
// - worker: 后台下载与过期清理

pub mod format;
pub mod manager;
pub mod worker;

pub use format::select_format;
pub use manager::{DownloadManager, DownloadRequest};
pub use worker::schedule_removal;
