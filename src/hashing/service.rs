//! Submission and retrieval of deferred digests.
//!
//! # Request States
//! ```text
//! Accepting ──(disabled)──▶ Rejected (503)
//!     │
//!     ▼
//! Validated ──▶ Dispatched (id returned, digest scheduled)
//! ```

use arc_swap::ArcSwap;
use axum::http::Method;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::HashingConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::hashing::jobs::{DeferredJob, JobScheduler};
use crate::hashing::store::{JobId, JobStore};
use crate::lifecycle::shutdown::Disable;
use crate::lifecycle::tracker::WorkTracker;
use crate::observability::metrics;
use crate::observability::stats::RequestStats;

/// Live hashing settings, swapped on reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HashSettings {
    delay: Duration,
}

impl From<&HashingConfig> for HashSettings {
    fn from(config: &HashingConfig) -> Self {
        Self {
            delay: config.delay(),
        }
    }
}

/// Accepts submissions and serves their digests once computed.
pub struct HashService {
    enabled: AtomicBool,
    settings: ArcSwap<HashSettings>,
    store: JobStore,
    scheduler: JobScheduler,
    stats: Arc<RequestStats>,
}

impl HashService {
    pub fn new(
        config: &HashingConfig,
        store: JobStore,
        tracker: WorkTracker,
        stats: Arc<RequestStats>,
    ) -> Self {
        Self {
            enabled: AtomicBool::new(true),
            settings: ArcSwap::from_pointee(HashSettings::from(config)),
            scheduler: JobScheduler::new(store.clone(), tracker),
            store,
            stats,
        }
    }

    /// Accept `input` for deferred hashing and return its id.
    ///
    /// Only the synchronous accept portion is recorded in the request stats.
    pub fn submit(&self, input: &str) -> ServiceResult<JobId> {
        let start = Instant::now();
        self.ensure_enabled()?;

        if input.is_empty() {
            return Err(ServiceError::Validation(
                "empty 'password' field".to_string(),
            ));
        }

        let id = self.store.allocate_id();
        self.scheduler.schedule(DeferredJob {
            id,
            input: input.to_owned(),
            delay: self.delay(),
        });

        let elapsed = start.elapsed();
        self.stats.add_request(elapsed);
        metrics::record_submission(elapsed);
        Ok(id)
    }

    /// Get the digest for `id`.
    ///
    /// An unknown id and a digest still being computed both yield
    /// [`ServiceError::NotFound`].
    pub fn retrieve(&self, id: JobId) -> ServiceResult<String> {
        self.ensure_enabled()?;
        match self.store.lookup(id) {
            Some(digest) => {
                metrics::record_lookup("hit");
                Ok(digest)
            }
            None => {
                metrics::record_lookup("miss");
                Err(ServiceError::NotFound(format!("no digest for id {}", id)))
            }
        }
    }

    /// Get the digest addressed by a `/hash/{id}` request path.
    pub fn retrieve_path(&self, path: &str) -> ServiceResult<String> {
        self.ensure_enabled()?;
        let id = parse_hash_path(path)?;
        self.retrieve(id)
    }

    /// The error for a request using the wrong verb.
    pub fn reject_method(&self, method: Method) -> ServiceError {
        match self.ensure_enabled() {
            Ok(()) => ServiceError::UnsupportedMethod(method),
            Err(e) => e,
        }
    }

    /// Change the delay applied to submissions accepted from now on.
    pub fn set_delay(&self, delay: Duration) {
        self.settings.store(Arc::new(HashSettings { delay }));
        tracing::info!(delay = ?delay, "Hashing delay updated");
    }

    /// Apply reloaded hashing settings.
    pub fn apply_config(&self, config: &HashingConfig) {
        let settings = HashSettings::from(config);
        if **self.settings.load() != settings {
            self.set_delay(settings.delay);
        }
    }

    pub fn delay(&self) -> Duration {
        self.settings.load().delay
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn store(&self) -> &JobStore {
        &self.store
    }

    fn ensure_enabled(&self) -> ServiceResult<()> {
        if self.is_enabled() {
            Ok(())
        } else {
            Err(ServiceError::Unavailable)
        }
    }
}

impl Disable for HashService {
    fn name(&self) -> &'static str {
        "hash"
    }

    fn disable(&self) {
        self.enabled.store(false, Ordering::Release);
    }
}

/// Parse `/hash/{id}`: exactly three `/`-separated segments, the last an integer.
pub fn parse_hash_path(path: &str) -> ServiceResult<JobId> {
    let segments: Vec<&str> = path.split('/').collect();
    if segments.len() != 3 {
        return Err(ServiceError::NotFound(format!(
            "malformed request path '{}'",
            path
        )));
    }

    let raw = segments[2];
    raw.parse::<u64>().map(JobId::from).map_err(|_| {
        ServiceError::NotFound(format!("non-integer request id: {}", raw))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::digest::digest;

    fn service(delay_ms: u64) -> (HashService, WorkTracker, Arc<RequestStats>) {
        let tracker = WorkTracker::new();
        let stats = Arc::new(RequestStats::new());
        let service = HashService::new(
            &HashingConfig { delay_ms },
            JobStore::new(),
            tracker.clone(),
            Arc::clone(&stats),
        );
        (service, tracker, stats)
    }

    #[test]
    fn test_parse_hash_path() {
        assert_eq!(parse_hash_path("/hash/42"), Ok(JobId::from(42)));
        assert!(matches!(
            parse_hash_path("/hash/abc"),
            Err(ServiceError::NotFound(_))
        ));
        assert!(parse_hash_path("/hash/1/2").is_err());
        assert!(parse_hash_path("/hash/").is_err());
        assert!(parse_hash_path("/hash/-1").is_err());
    }

    #[tokio::test]
    async fn test_empty_input_rejected() {
        let (service, tracker, stats) = service(1);
        assert!(matches!(
            service.submit(""),
            Err(ServiceError::Validation(_))
        ));
        assert_eq!(tracker.outstanding(), 0);
        assert_eq!(stats.snapshot().total, 0);
        assert_eq!(service.store().last_id(), 0);
    }

    #[tokio::test]
    async fn test_ids_increment() {
        let (service, _, stats) = service(1);
        assert_eq!(service.submit("neato").unwrap(), JobId::from(1));
        assert_eq!(service.submit("mosquito").unwrap(), JobId::from(2));
        assert_eq!(stats.snapshot().total, 2);
    }

    #[tokio::test]
    async fn test_get_nonexistent_hash() {
        let (service, _, _) = service(1);
        assert!(matches!(
            service.retrieve(JobId::from(77)),
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_digest_visible_after_delay() {
        let (service, tracker, _) = service(50);
        let id = service.submit("3.14159265358979").unwrap();

        assert!(matches!(
            service.retrieve(id),
            Err(ServiceError::NotFound(_))
        ));
        assert_eq!(tracker.outstanding(), 1);

        tracker.wait_drained().await;
        assert_eq!(service.retrieve(id), Ok(digest("3.14159265358979")));
        assert_eq!(
            service.retrieve_path(&format!("/hash/{}", id)),
            Ok(digest("3.14159265358979"))
        );
    }

    #[tokio::test]
    async fn test_disable_rejects_everything() {
        let (service, _, _) = service(1);
        let id = service.submit("neato").unwrap();

        service.disable();
        service.disable();
        assert!(!service.is_enabled());
        assert_eq!(service.submit("again"), Err(ServiceError::Unavailable));
        assert_eq!(service.retrieve(id), Err(ServiceError::Unavailable));
        assert_eq!(
            service.retrieve_path("/hash/garbage"),
            Err(ServiceError::Unavailable)
        );
        assert_eq!(
            service.reject_method(Method::PUT),
            ServiceError::Unavailable
        );
    }

    #[tokio::test]
    async fn test_set_delay() {
        let (service, _, _) = service(5_000);
        assert_eq!(service.delay(), Duration::from_secs(5));

        service.set_delay(Duration::from_micros(1));
        assert_eq!(service.delay(), Duration::from_micros(1));

        service.apply_config(&HashingConfig { delay_ms: 20 });
        assert_eq!(service.delay(), Duration::from_millis(20));
    }
}
