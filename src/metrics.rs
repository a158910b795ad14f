//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use lazy_static::lazy_static;
use prometheus::{IntCounter, IntCounterVec, Opts, Registry};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // Login Metrics
    pub static ref LOGINS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("google_login_logins_total", "Total number of OAuth login attempts by outcome"),
        &["provider", "outcome"]
    ).expect("metric can be created");
    pub static ref USERS_CREATED_TOTAL: IntCounter = IntCounter::new(
        "google_login_users_created_total",
        "Total number of local users provisioned from a provider identity"
    ).expect("metric can be created");
    pub static ref LOGOUTS_TOTAL: IntCounter = IntCounter::new(
        "google_login_logouts_total",
        "Total number of logouts"
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("google_login_errors_total", "Total number of errors"),
        &["error_type"]
    ).expect("metric can be created");
}

/// Login outcome label values
pub mod outcome {
    pub const LINKED: &str = "linked";
    pub const CREATED: &str = "created";
    pub const TOKEN_MISSING: &str = "token_missing";
    pub const PROFILE_FETCH_FAILED: &str = "profile_fetch_failed";
    pub const ERROR: &str = "error";
}

/// Record the outcome of a single login callback.
pub fn observe_login(provider: &str, outcome: &str) {
    LOGINS_TOTAL.with_label_values(&[provider, outcome]).inc();
}

/// Initialize metrics registry.
pub fn init_metrics() {
    REGISTRY
        .register(Box::new(LOGINS_TOTAL.clone()))
        .expect("LOGINS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(USERS_CREATED_TOTAL.clone()))
        .expect("USERS_CREATED_TOTAL can be registered");
    REGISTRY
        .register(Box::new(LOGOUTS_TOTAL.clone()))
        .expect("LOGOUTS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(ERRORS_TOTAL.clone()))
        .expect("ERRORS_TOTAL can be registered");

    tracing::info!("Metrics registry initialized");
}
