//! Prometheus metrics for the analysis engine

use once_cell::sync::Lazy;
use prometheus::{
    register_counter, register_counter_vec, register_gauge, register_histogram_vec, Counter,
    CounterVec, Encoder, Gauge, HistogramVec, TextEncoder,
};

// ── Analysis metrics ─────────────────────────────────────────────────────────

pub static ANALYSIS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "prism_analysis_total",
        "Analyses run, by analyzer and outcome",
        &["analyzer", "status"]
    )
    .unwrap()
});

pub static ANALYSIS_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "prism_analysis_duration_seconds",
        "Analysis latency",
        &["analyzer"],
        vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0]
    )
    .unwrap()
});

pub static RECORDS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "prism_records_total",
        "Log records or profile samples consumed",
        &["analyzer"]
    )
    .unwrap()
});

pub static SLOWLOG_TIMEOUTS: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "prism_slowlog_timeouts_total",
        "Slow-log analyses truncated by the deadline"
    )
    .unwrap()
});

// ── Store metrics ────────────────────────────────────────────────────────────

pub static STORE_ARTIFACTS: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!(
        "prism_store_artifacts",
        "Artifacts held by the in-memory store"
    )
    .unwrap()
});

pub static STORE_EVICTIONS: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "prism_store_evictions_total",
        "Artifacts evicted from the in-memory store at capacity"
    )
    .unwrap()
});

/// Record the outcome and latency of one analysis
pub fn observe(analyzer: &str, ok: bool, started: std::time::Instant) {
    let status = if ok { "ok" } else { "error" };
    ANALYSIS_TOTAL.with_label_values(&[analyzer, status]).inc();
    ANALYSIS_DURATION
        .with_label_values(&[analyzer])
        .observe(started.elapsed().as_secs_f64());
}

/// Render all registered metrics to Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}
