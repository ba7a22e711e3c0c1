//! Time-bounded cache of the latest aggregation result.
//!
//! This module provides:
//! - `CacheStore`, the lock-protected holder of the latest result
//! - `RefreshScheduler`, which runs the pipeline at startup, on an interval,
//!   and on demand
//! - `CacheService`, the read/refresh/health surface used by the console

mod scheduler;
mod service;
mod store;

pub use scheduler::RefreshPolicy;
pub use service::CacheService;
