use crate::jobs::{JobRegistry, JobSnapshot};

/// 记录最近一次推送的注册表快照，只在内容变化时产出新帧
#[derive(Debug, Default)]
pub struct SnapshotTracker {
    last_sent: JobSnapshot,
}

impl SnapshotTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 读取当前快照；与上次推送的内容不同时返回它，并记为已推送
    pub fn poll(&mut self, registry: &JobRegistry) -> Option<&JobSnapshot> {
        let current = registry.snapshot();
        if current == self.last_sent {
            return None;
        }
        self.last_sent = current;
        Some(&self.last_sent)
    }
}
