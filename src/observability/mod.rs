//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Hashing service and HTTP layer produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!     → stats.rs (request count and mean latency served on /stats)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape, optional)
//!     → GET /stats
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every request span
//! - `/stats` is served from `RequestStats`, independent of the metrics exporter

pub mod logging;
pub mod metrics;
pub mod stats;

pub use stats::{RequestStats, StatsReporter, StatsSnapshot};
