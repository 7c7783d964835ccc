//! Timeline Service Metrics
//!
//! Prometheus metrics for the feed and activity builders

use once_cell::sync::Lazy;
use prometheus::{
    register_histogram, register_histogram_vec, register_int_counter_vec, Encoder, Histogram,
    HistogramVec, IntCounterVec, TextEncoder,
};
use std::time::Duration;

static BUILD_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "timeline_service_build_duration_seconds",
        "Duration of feed/timeline builds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]
    )
    .expect("Failed to register timeline build duration metric")
});

static BUILDS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "timeline_service_builds_total",
        "Total feed/timeline builds by outcome",
        &["operation", "status"]
    )
    .expect("Failed to register timeline builds metric")
});

static ACTIVITY_ROWS_LOADED: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "timeline_service_activity_rows_loaded",
        "Rows loaded across all sources before an activity merge",
        vec![0.0, 10.0, 50.0, 100.0, 500.0, 1000.0, 5000.0, 10000.0, 50000.0]
    )
    .expect("Failed to register activity rows metric")
});

/// Record one build with its outcome (`success` or an error kind)
pub fn record_build(operation: &str, status: &str, duration: Duration) {
    BUILDS_TOTAL.with_label_values(&[operation, status]).inc();
    BUILD_DURATION_SECONDS
        .with_label_values(&[operation])
        .observe(duration.as_secs_f64());
}

/// Record how many rows an activity build pulled into memory
pub fn record_activity_rows(rows: usize) {
    ACTIVITY_ROWS_LOADED.observe(rows as f64);
}

/// Render the default registry in the Prometheus text format
pub fn render() -> Result<(String, String), prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;

    let body = String::from_utf8(buffer)
        .map_err(|e| prometheus::Error::Msg(format!("metrics are not UTF-8: {}", e)))?;
    Ok((encoder.format_type().to_string(), body))
}
