//! Deferred hashing subsystem.
//!
//! # Data Flow
//! ```text
//! POST /hash (password)
//!     → service.rs (validate, allocate id, record latency)
//!     → jobs.rs (schedule DeferredJob, holds a unit of outstanding work)
//!         ... delay ...
//!     → digest.rs (SHA-512, base64)
//!     → store.rs (id → digest, written once)
//!
//! GET /hash/{id}
//!     → service.rs (parse path) → store.rs (lookup)
//! ```

pub mod digest;
pub mod jobs;
pub mod service;
pub mod store;

pub use digest::digest;
pub use jobs::{DeferredJob, JobScheduler};
pub use service::HashService;
pub use store::{JobId, JobStore};
