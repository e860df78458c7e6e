//! HTTP middleware

pub mod rate_limit;
pub mod request_metrics;

pub use rate_limit::{rate_limit_middleware, PublicWriteLimiter};
pub use request_metrics::track_metrics;
