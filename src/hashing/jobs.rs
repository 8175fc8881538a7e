//! Deferred digest jobs and the scheduler that runs them.

use std::time::Duration;
use tokio::task::JoinHandle;

use crate::hashing::digest::digest;
use crate::hashing::store::{JobId, JobStore};
use crate::lifecycle::tracker::{WorkKind, WorkTracker};
use crate::observability::metrics;

/// One submission waiting for its digest to be computed.
#[derive(Debug, Clone)]
pub struct DeferredJob {
    pub id: JobId,
    pub input: String,
    pub delay: Duration,
}

impl DeferredJob {
    async fn run(self, store: &JobStore) {
        tokio::time::sleep(self.delay).await;
        store.record_result(self.id, digest(&self.input));
        metrics::record_job_completed();
        tracing::debug!(job_id = %self.id, "Digest stored");
    }
}

/// Runs deferred jobs on the tokio runtime.
///
/// Each scheduled job holds a unit of outstanding work from the moment it
/// is accepted until its result is stored, so shutdown waits for it.
#[derive(Debug, Clone)]
pub struct JobScheduler {
    store: JobStore,
    tracker: WorkTracker,
}

impl JobScheduler {
    pub fn new(store: JobStore, tracker: WorkTracker) -> Self {
        Self { store, tracker }
    }

    /// Hand a job to the runtime. Does not wait for it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule(&self, job: DeferredJob) -> JoinHandle<()> {
        let guard = self.tracker.track(WorkKind::DeferredJob);
        let store = self.store.clone();

        tracing::debug!(job_id = %job.id, delay = ?job.delay, "Deferred job scheduled");
        tokio::spawn(async move {
            let _guard = guard;
            job.run(&store).await;
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler() -> (JobScheduler, JobStore, WorkTracker) {
        let store = JobStore::new();
        let tracker = WorkTracker::new();
        (
            JobScheduler::new(store.clone(), tracker.clone()),
            store,
            tracker,
        )
    }

    #[tokio::test]
    async fn test_job_result_after_delay() {
        let (scheduler, store, tracker) = scheduler();
        let id = store.allocate_id();

        let handle = scheduler.schedule(DeferredJob {
            id,
            input: "3.14159265358979".into(),
            delay: Duration::from_millis(1),
        });
        assert_eq!(tracker.outstanding(), 1);

        handle.await.unwrap();
        assert_eq!(store.lookup(id), Some(digest("3.14159265358979")));
        assert_eq!(tracker.outstanding(), 0);
    }

    #[tokio::test]
    async fn test_result_absent_before_delay() {
        let (scheduler, store, tracker) = scheduler();
        let id = store.allocate_id();

        let handle = scheduler.schedule(DeferredJob {
            id,
            input: "777".into(),
            delay: Duration::from_millis(200),
        });

        assert!(store.lookup(id).is_none());
        assert_eq!(tracker.outstanding(), 1);

        handle.await.unwrap();
        assert!(store.lookup(id).is_some());
    }

    #[tokio::test]
    async fn test_out_of_order_completion() {
        let (scheduler, store, _) = scheduler();
        let slow = store.allocate_id();
        let fast = store.allocate_id();

        let slow_handle = scheduler.schedule(DeferredJob {
            id: slow,
            input: "slow".into(),
            delay: Duration::from_millis(200),
        });
        let fast_handle = scheduler.schedule(DeferredJob {
            id: fast,
            input: "fast".into(),
            delay: Duration::from_millis(1),
        });

        fast_handle.await.unwrap();
        assert!(store.lookup(fast).is_some());
        assert!(store.lookup(slow).is_none());

        slow_handle.await.unwrap();
        assert!(store.lookup(slow).is_some());
    }
}
