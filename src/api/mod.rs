//! API layer
//!
//! HTTP handlers for:
//! - Entry, post-login and logout pages
//! - Metrics (Prometheus)

pub mod metrics;
mod pages;

pub use metrics::metrics_router;
pub use pages::pages_router;
