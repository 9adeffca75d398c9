//! 下载任务注册表
//!
//! 进程内唯一的共享可变状态：job_id -> DownloadJob。
//! 基于 DashMap 分片锁，单个 key 的读写是原子的，
//! 读者永远不会看到混合了两次状态迁移字段的记录。

use crate::jobs::{DownloadJob, JobError};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::BTreeMap;

/// 注册表快照（有序，便于比较和稳定序列化）
pub type JobSnapshot = BTreeMap<String, DownloadJob>;

/// 下载任务注册表
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: DashMap<String, DownloadJob>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入一个 queued 状态的新任务
    pub fn create(&self, id: &str) -> Result<(), JobError> {
        match self.jobs.entry(id.to_string()) {
            Entry::Occupied(_) => Err(JobError::AlreadyExists(id.to_string())),
            Entry::Vacant(entry) => {
                entry.insert(DownloadJob::queued());
                Ok(())
            }
        }
    }

    /// 获取任务快照
    pub fn get(&self, id: &str) -> Option<DownloadJob> {
        self.jobs.get(id).map(|job| job.value().clone())
    }

    /// 整体替换任务状态
    pub fn set(&self, id: &str, job: DownloadJob) {
        self.jobs.insert(id.to_string(), job);
    }

    /// 在 key 锁内原地修改任务，任务不存在时返回 false
    pub fn update<F>(&self, id: &str, f: F) -> bool
    where
        F: FnOnce(&mut DownloadJob),
    {
        match self.jobs.get_mut(id) {
            Some(mut job) => {
                f(job.value_mut());
                true
            }
            None => false,
        }
    }

    /// 删除任务（幂等）
    pub fn remove(&self, id: &str) {
        self.jobs.remove(id);
    }

    /// 所有任务的时间点拷贝
    ///
    /// 单个任务整体拷贝，不保证跨任务的原子性
    pub fn snapshot(&self) -> JobSnapshot {
        self.jobs
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::JobStatus;
    use std::sync::Arc;

    #[test]
    fn test_create_and_get() {
        let registry = JobRegistry::new();
        registry.create("job-1").unwrap();

        let job = registry.get("job-1").unwrap();
        assert_eq!(job.status, JobStatus::Queued);
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_create_duplicate_fails() {
        let registry = JobRegistry::new();
        registry.create("job-1").unwrap();
        registry.set("job-1", DownloadJob::downloading(None, Some(1), Some(2)));

        let err = registry.create("job-1").unwrap_err();
        assert!(matches!(err, JobError::AlreadyExists(ref id) if id == "job-1"));
        // 原记录不受影响
        assert_eq!(registry.get("job-1").unwrap().status, JobStatus::Downloading);
    }

    #[test]
    fn test_set_replaces_whole_record() {
        let registry = JobRegistry::new();
        registry.create("job-1").unwrap();
        registry.set("job-1", DownloadJob::downloading(Some("a.mp4".into()), Some(50), Some(200)));
        registry.set("job-1", DownloadJob::failed("boom"));

        let job = registry.get("job-1").unwrap();
        assert_eq!(job.status, JobStatus::Error);
        assert!(job.percent.is_none());
        assert!(job.filename.is_none());
        assert!(job.downloaded_bytes.is_none());
    }

    #[test]
    fn test_update_preserves_other_fields() {
        let registry = JobRegistry::new();
        registry.set("job-1", DownloadJob::finished(Some("a.mp4".into())));

        let updated = registry.update("job-1", |job| job.thumbnail = Some("a.png".into()));
        assert!(updated);

        let job = registry.get("job-1").unwrap();
        assert_eq!(job.filename.as_deref(), Some("a.mp4"));
        assert_eq!(job.thumbnail.as_deref(), Some("a.png"));
        assert!(!registry.update("missing", |job| job.thumbnail = None));
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let registry = JobRegistry::new();
        registry.create("job-1").unwrap();
        registry.remove("job-1");
        registry.remove("job-1");
        assert!(registry.is_empty());
    }

    #[test]
    fn test_snapshot_is_detached_copy() {
        let registry = JobRegistry::new();
        registry.create("b").unwrap();
        registry.create("a").unwrap();

        let snapshot = registry.snapshot();
        registry.set("a", DownloadJob::failed("later"));

        assert_eq!(snapshot.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(snapshot["a"].status, JobStatus::Queued);
        assert_ne!(snapshot, registry.snapshot());
    }

    #[test]
    fn test_concurrent_writers_on_disjoint_keys() {
        let registry = Arc::new(JobRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    let id = format!("job-{}", i);
                    registry.create(&id).unwrap();
                    for n in 0..100u64 {
                        registry.set(&id, DownloadJob::downloading(None, Some(n), Some(100)));
                    }
                    registry.set(&id, DownloadJob::finished(None));
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 8);
        assert!(snapshot.values().all(|job| job.status == JobStatus::Finished));
    }
}
