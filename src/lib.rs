//! Deferred Hashing Service Library
//!
//! Accepts secrets over HTTP, hashes them after a configurable delay, serves
//! the digests by id, reports request timing, and shuts down only after all
//! accepted work has finished.

pub mod config;
pub mod error;
pub mod hashing;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::schema::ServiceConfig;
pub use error::{ServiceError, ServiceResult};
pub use http::HttpServer;
pub use lifecycle::{ShutdownComplete, ShutdownCoordinator};
