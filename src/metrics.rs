/// Metrics and telemetry for ENS Attest
///
/// Prometheus counters for:
/// - Session lifecycle
/// - Stale results discarded by the session guard
/// - Registry text lookups
/// - Presentation fetches

use crate::registry::TextKey;
use lazy_static::lazy_static;
use prometheus::{
    register_int_counter, register_int_counter_vec, Encoder, IntCounter, IntCounterVec,
    TextEncoder,
};

lazy_static! {
    // ========== Session Metrics ==========

    /// Sessions started by a committed name
    pub static ref SESSIONS_STARTED_TOTAL: IntCounter = register_int_counter!(
        "attest_sessions_started_total",
        "Total number of resolution sessions started"
    )
    .unwrap();

    /// Sessions that settled while still current
    pub static ref SESSIONS_RESOLVED_TOTAL: IntCounter = register_int_counter!(
        "attest_sessions_resolved_total",
        "Total number of resolution sessions that resolved while current"
    )
    .unwrap();

    /// Results that arrived after their session was replaced
    pub static ref STALE_RESULTS_DISCARDED_TOTAL: IntCounter = register_int_counter!(
        "attest_stale_results_discarded_total",
        "Total number of results discarded because their session was no longer current"
    )
    .unwrap();

    // ========== Lookup Metrics ==========

    /// Text record lookups by key and outcome
    pub static ref TEXT_LOOKUPS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "attest_text_lookups_total",
        "Total number of registry text record lookups",
        &["key", "outcome"]
    )
    .unwrap();

    /// Presentation fetches by outcome
    pub static ref PRESENTATION_FETCHES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "attest_presentation_fetches_total",
        "Total number of presentation service fetches",
        &["outcome"]
    )
    .unwrap();
}

/// Record a text record lookup
pub fn record_text_lookup(key: TextKey, outcome: &str) {
    TEXT_LOOKUPS_TOTAL
        .with_label_values(&[key.as_str(), outcome])
        .inc();
}

/// Record a presentation fetch
pub fn record_presentation_fetch(outcome: &str) {
    PRESENTATION_FETCHES_TOTAL.with_label_values(&[outcome]).inc();
}

/// Render all metrics in Prometheus text format
pub fn render_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap_or_default();
    String::from_utf8(buffer).unwrap_or_default()
}
