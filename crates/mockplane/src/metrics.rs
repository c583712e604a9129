//! Prometheus metrics for the control plane.
//!
//! Tracks mutations, rejected claims, compensating writes and engine
//! notification failures.
use lazy_static::lazy_static;
use prometheus::{register_counter_vec, CounterVec, Encoder, TextEncoder};
use tracing::warn;

lazy_static! {
    /// Mutations handled by the synchronizer
    pub static ref MUTATIONS_TOTAL: CounterVec = register_counter_vec!(
        "mockplane_mutations_total",
        "Total number of mock mutations handled by the control plane",
        &["operation", "result"]  // result: created|merged|ok|rejected|error
    )
    .unwrap();

    /// Port and route conflicts that rejected a mutation
    pub static ref CONFLICTS_TOTAL: CounterVec = register_counter_vec!(
        "mockplane_conflicts_total",
        "Total number of rejected port or route claims",
        &["kind"]  // kind: crossProtocol|crossWorkspace|mergeNotAllowed|duplicateInBatch|exact|namespaceShadow|engine
    )
    .unwrap();

    /// Compensating writes after an engine failure
    pub static ref ROLLBACKS_TOTAL: CounterVec = register_counter_vec!(
        "mockplane_rollbacks_total",
        "Total number of compensating store writes",
        &["operation", "result"]  // result: success|error
    )
    .unwrap();

    /// Engine notifications that failed and were not compensated
    pub static ref ENGINE_NOTIFY_FAILURES_TOTAL: CounterVec = register_counter_vec!(
        "mockplane_engine_notify_failures_total",
        "Total number of best-effort engine notifications that failed",
        &["operation"]
    )
    .unwrap();
}

/// Collect and return all metrics in Prometheus text format
pub fn collect_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Helper to record a mutation outcome
pub fn record_mutation(operation: &str, result: &str) {
    MUTATIONS_TOTAL.with_label_values(&[operation, result]).inc();
}

/// Helper to record a rejected claim
pub fn record_conflict(kind: &str) {
    CONFLICTS_TOTAL.with_label_values(&[kind]).inc();
}

/// Helper to record a compensating write
pub fn record_rollback(operation: &str, success: bool) {
    let result = if success { "success" } else { "error" };
    ROLLBACKS_TOTAL.with_label_values(&[operation, result]).inc();
}

/// Helper to record a failed best-effort engine notification
pub fn record_engine_notify_failure(operation: &str) {
    ENGINE_NOTIFY_FAILURES_TOTAL
        .with_label_values(&[operation])
        .inc();
}
