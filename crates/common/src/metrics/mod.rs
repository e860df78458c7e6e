//! Metrics and observability utilities
//!
//! Prometheus metrics with standardized naming for the catalog service.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all PDFHub metrics
pub const METRICS_PREFIX: &str = "pdfhub";

/// Histogram buckets for request latency (in seconds)
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001,  // 1ms
    0.005,  // 5ms
    0.010,  // 10ms
    0.025,  // 25ms
    0.050,  // 50ms
    0.100,  // 100ms
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.500,  // 2.5s
    5.000,  // 5s
];

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    describe_counter!(
        format!("{}_catalog_queries_total", METRICS_PREFIX),
        Unit::Count,
        "Catalog search and browse queries by mode"
    );

    describe_histogram!(
        format!("{}_catalog_query_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Time spent matching and filtering records"
    );

    describe_counter!(
        format!("{}_ratings_total", METRICS_PREFIX),
        Unit::Count,
        "Ratings submitted, labelled by star value"
    );

    describe_counter!(
        format!("{}_reviews_total", METRICS_PREFIX),
        Unit::Count,
        "Reviews submitted"
    );

    describe_counter!(
        format!("{}_file_redirects_total", METRICS_PREFIX),
        Unit::Count,
        "View and download redirects issued"
    );

    describe_counter!(
        format!("{}_admin_actions_total", METRICS_PREFIX),
        Unit::Count,
        "Administrator mutations by action"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Record a search or browse evaluation
pub fn record_catalog_query(duration_secs: f64, mode: &str) {
    counter!(
        format!("{}_catalog_queries_total", METRICS_PREFIX),
        "mode" => mode.to_string()
    )
    .increment(1);

    histogram!(
        format!("{}_catalog_query_duration_seconds", METRICS_PREFIX),
        "mode" => mode.to_string()
    )
    .record(duration_secs);
}

pub fn record_rating(stars: u8) {
    counter!(
        format!("{}_ratings_total", METRICS_PREFIX),
        "stars" => stars.to_string()
    )
    .increment(1);
}

pub fn record_review() {
    counter!(format!("{}_reviews_total", METRICS_PREFIX)).increment(1);
}

pub fn record_redirect(kind: &str) {
    counter!(
        format!("{}_file_redirects_total", METRICS_PREFIX),
        "kind" => kind.to_string()
    )
    .increment(1);
}

pub fn record_admin_action(action: &str) {
    counter!(
        format!("{}_admin_actions_total", METRICS_PREFIX),
        "action" => action.to_string()
    )
    .increment(1);
}
