//! Outstanding-work tracking for graceful shutdown.
//!
//! # Responsibilities
//! - Count units of work in progress (request handlers and deferred jobs)
//! - Release a unit when its guard drops, even on early return or panic
//! - Let shutdown wait until the count reaches zero

use std::sync::Arc;
use tokio::sync::watch;

use crate::observability::metrics;

/// The kind of work a guard accounts for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkKind {
    /// An HTTP request handler.
    Request,
    /// A scheduled digest computation.
    DeferredJob,
}

impl std::fmt::Display for WorkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkKind::Request => write!(f, "request"),
            WorkKind::DeferredJob => write!(f, "deferred_job"),
        }
    }
}

/// Tracks outstanding work.
///
/// The count lives in a watch channel so waiters are woken on every change
/// instead of polling.
#[derive(Debug, Clone)]
pub struct WorkTracker {
    outstanding: Arc<watch::Sender<usize>>,
}

impl WorkTracker {
    /// Create a new tracker with nothing outstanding.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(0);
        Self {
            outstanding: Arc::new(tx),
        }
    }

    /// Record a new unit of work. Returns a guard that releases it on drop.
    pub fn track(&self, kind: WorkKind) -> WorkGuard {
        let mut now = 0;
        self.outstanding.send_modify(|n| {
            *n += 1;
            now = *n;
        });
        metrics::record_outstanding_work(now);
        tracing::trace!(kind = %kind, outstanding = now, "Work started");

        WorkGuard {
            outstanding: Arc::clone(&self.outstanding),
            kind,
        }
    }

    /// Get the current number of outstanding units.
    pub fn outstanding(&self) -> usize {
        *self.outstanding.borrow()
    }

    /// Wait until no work is outstanding.
    ///
    /// Returns immediately if nothing is in progress.
    pub async fn wait_drained(&self) {
        let mut rx = self.outstanding.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|n| *n == 0).await;
    }
}

impl Default for WorkTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard that tracks one unit of work.
/// Decrements the outstanding count when dropped.
#[derive(Debug)]
pub struct WorkGuard {
    outstanding: Arc<watch::Sender<usize>>,
    kind: WorkKind,
}

impl WorkGuard {
    pub fn kind(&self) -> WorkKind {
        self.kind
    }
}

impl Drop for WorkGuard {
    fn drop(&mut self) {
        let mut now = 0;
        self.outstanding.send_modify(|n| {
            *n = n.saturating_sub(1);
            now = *n;
        });
        metrics::record_outstanding_work(now);
        tracing::trace!(kind = %self.kind, outstanding = now, "Work finished");
    }
}
