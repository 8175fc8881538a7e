//! Deferred job results, keyed by submission id.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::observability::metrics;

/// Identifier handed back for an accepted submission.
///
/// Positive, strictly increasing from 1, never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(u64);

impl JobId {
    /// Get the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for JobId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A thread-safe store of computed digests.
///
/// An id with no entry is either unknown or still being processed; the two
/// cases are not distinguished.
#[derive(Clone, Default)]
pub struct JobStore {
    last_id: Arc<AtomicU64>,
    results: Arc<DashMap<JobId, String>>,
}

impl JobStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the next identifier.
    pub fn allocate_id(&self) -> JobId {
        JobId(self.last_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Highest identifier allocated so far, 0 if none.
    pub fn last_id(&self) -> u64 {
        self.last_id.load(Ordering::SeqCst)
    }

    /// Store the digest for a job.
    pub fn record_result(&self, id: JobId, digest: String) {
        if self.results.insert(id, digest).is_some() {
            tracing::warn!(job_id = %id, "Digest recorded twice, keeping the latest");
        }
        metrics::record_stored_results(self.results.len());
    }

    /// Get the digest for a job if it has been computed.
    pub fn lookup(&self, id: JobId) -> Option<String> {
        self.results.get(&id).map(|r| r.value().clone())
    }

    /// Number of computed digests.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

impl std::fmt::Debug for JobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobStore")
            .field("last_id", &self.last_id())
            .field("stored", &self.len())
            .finish()
    }
}
