//! HTTP middleware shared by all routes

pub mod metrics;
pub mod security_headers;

pub use metrics::metrics_middleware;
pub use security_headers::security_headers_middleware;
