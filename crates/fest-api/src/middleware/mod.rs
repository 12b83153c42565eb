//! Request middleware: rate limiting and request metrics.

pub mod metrics;
pub mod rate_limit;
