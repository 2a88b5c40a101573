//! Volley's dispatch engine: lock-free run counters, the client pool and its
//! transport seam, the request-to-client selection policies, the per-request
//! worker protocol under both concurrency models, and the periodic reporter.

pub mod engine;
pub mod metrics;
pub mod policy;
pub mod pool;
pub mod reporter;
pub mod worker;
