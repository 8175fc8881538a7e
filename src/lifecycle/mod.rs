//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Bind listener → Serve
//!
//! Work tracking (tracker.rs):
//!     Request or deferred job begins → guard acquired → guard dropped on exit
//!
//! Shutdown (shutdown.rs):
//!     GET /shutdown or signal → Disable components → Drain work → Stop listener → Complete
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → same sequence as GET /shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered shutdown: stop accepting work, drain, then close the listener
//! - No drain deadline: accepted jobs always finish
//! - Shutdown is idempotent; only the first caller tears down

pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod tracker;

pub use shutdown::{Disable, ShutdownComplete, ShutdownCoordinator};
pub use tracker::{WorkGuard, WorkKind, WorkTracker};
