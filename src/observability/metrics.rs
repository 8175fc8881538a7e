//! Metrics collection and exposition.
//!
//! # Metrics
//! - `hash_submissions_total` (counter): accepted submissions
//! - `hash_submit_duration_seconds` (histogram): synchronous accept latency
//! - `hash_jobs_completed_total` (counter): digests written to the store
//! - `hash_stored_results` (gauge): digests currently held
//! - `hash_lookups_total` (counter): lookups by outcome (hit, miss)
//! - `hash_outstanding_work` (gauge): request handlers and jobs in progress
//! - `http_rejected_total` (counter): error responses by reason
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade and is a no-op until an
//!   exporter is installed
//! - The Prometheus exporter is opt-in (`observability.metrics_enabled`)

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Duration;

/// Install the Prometheus exporter and serve it on `addr`.
///
/// Must be called from within a tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_submission(latency: Duration) {
    metrics::counter!("hash_submissions_total").increment(1);
    metrics::histogram!("hash_submit_duration_seconds").record(latency.as_secs_f64());
}

pub fn record_job_completed() {
    metrics::counter!("hash_jobs_completed_total").increment(1);
}

pub fn record_stored_results(count: usize) {
    metrics::gauge!("hash_stored_results").set(count as f64);
}

pub fn record_lookup(outcome: &'static str) {
    metrics::counter!("hash_lookups_total", "outcome" => outcome).increment(1);
}

pub fn record_outstanding_work(count: usize) {
    metrics::gauge!("hash_outstanding_work").set(count as f64);
}

pub fn record_rejection(reason: &'static str) {
    metrics::counter!("http_rejected_total", "reason" => reason).increment(1);
}
