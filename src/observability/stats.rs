//! Aggregate request timing reported by `/stats`.
//!
//! # Responsibilities
//! - Accumulate count and total latency of accepted submissions
//! - Produce a consistent snapshot (count and truncated mean)
//! - Gate the `/stats` endpoint behind its own enabled flag
//!
//! # Design Decisions
//! - Count and total share one mutex so a snapshot never divides by a stale count
//! - Mean latency is reported in whole nanoseconds

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::error::{ServiceError, ServiceResult};
use crate::lifecycle::shutdown::Disable;

#[derive(Debug, Default)]
struct Totals {
    requests: u64,
    total_time: Duration,
}

/// Thread-safe tracker of total requests and their processing time.
#[derive(Debug, Default)]
pub struct RequestStats {
    totals: Mutex<Totals>,
}

/// Point-in-time view of [`RequestStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Number of requests recorded.
    pub total: u64,
    /// Mean latency in nanoseconds, truncated; 0 when nothing is recorded.
    pub average: u64,
}

impl RequestStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one handled request.
    pub fn add_request(&self, latency: Duration) {
        let mut totals = self.totals.lock().unwrap_or_else(PoisonError::into_inner);
        totals.requests += 1;
        totals.total_time += latency;
    }

    /// Read count and mean latency under a single lock acquisition.
    pub fn snapshot(&self) -> StatsSnapshot {
        let totals = self.totals.lock().unwrap_or_else(PoisonError::into_inner);
        let average = match totals.requests {
            0 => 0,
            n => (totals.total_time.as_nanos() / u128::from(n)) as u64,
        };
        StatsSnapshot {
            total: totals.requests,
            average,
        }
    }
}

/// The `/stats` endpoint component.
#[derive(Debug)]
pub struct StatsReporter {
    stats: Arc<RequestStats>,
    enabled: AtomicBool,
}

impl StatsReporter {
    pub fn new(stats: Arc<RequestStats>) -> Self {
        Self {
            stats,
            enabled: AtomicBool::new(true),
        }
    }

    /// Current statistics, unless the endpoint has been disabled.
    pub fn report(&self) -> ServiceResult<StatsSnapshot> {
        if !self.is_enabled() {
            return Err(ServiceError::Unavailable);
        }
        Ok(self.stats.snapshot())
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// The error for a request using the wrong verb.
    pub fn reject_method(&self, method: axum::http::Method) -> ServiceError {
        if self.is_enabled() {
            ServiceError::UnsupportedMethod(method)
        } else {
            ServiceError::Unavailable
        }
    }
}

impl Disable for StatsReporter {
    fn name(&self) -> &'static str {
        "stats"
    }

    fn disable(&self) {
        self.enabled.store(false, Ordering::Release);
    }
}
