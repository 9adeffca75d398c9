//! WebSocket 模块
//!
//! 提供下载状态实时推送

mod handler;
mod snapshot;

pub use handler::handle_download_status_ws;
pub use snapshot::SnapshotTracker;
