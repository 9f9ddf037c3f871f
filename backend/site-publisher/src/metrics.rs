//! Prometheus metrics for site publishing
//!
//! Tracks publish outcomes, object churn, media uploads, distribution
//! creation, invalidations and teardown failures.

use actix_web::HttpResponse;
use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, Encoder, HistogramVec,
    IntCounter, IntCounterVec, TextEncoder,
};
use std::time::Duration;

/// Publish attempts by outcome (success/upload_failed/cleanup_failed)
static PUBLISH_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "site_publisher_publish_total",
        "Total number of publish attempts by outcome",
        &["outcome"]
    )
    .expect("failed to register site_publisher_publish_total")
});

static PUBLISH_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "site_publisher_publish_duration_seconds",
        "Duration of publish reconciliation",
        &["outcome"],
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    )
    .expect("failed to register site_publisher_publish_duration_seconds")
});

static PAGES_UPLOADED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "site_publisher_pages_uploaded_total",
        "Total page documents written to object storage"
    )
    .expect("failed to register site_publisher_pages_uploaded_total")
});

static ORPHANS_REMOVED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "site_publisher_orphans_removed_total",
        "Total orphaned page objects deleted after publish"
    )
    .expect("failed to register site_publisher_orphans_removed_total")
});

static MEDIA_UPLOADS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "site_publisher_media_uploads_total",
        "Total media uploads by outcome",
        &["outcome"]
    )
    .expect("failed to register site_publisher_media_uploads_total")
});

static DISTRIBUTIONS_CREATED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "site_publisher_distributions_created_total",
        "Total CDN distribution creation attempts by outcome",
        &["outcome"]
    )
    .expect("failed to register site_publisher_distributions_created_total")
});

static INVALIDATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "site_publisher_invalidations_total",
        "Total CDN invalidation requests by outcome",
        &["outcome"]
    )
    .expect("failed to register site_publisher_invalidations_total")
});

static TEARDOWN_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "site_publisher_teardown_failures_total",
        "Website teardown phases that failed",
        &["phase"]
    )
    .expect("failed to register site_publisher_teardown_failures_total")
});

/// Record a publish attempt and how long it took
pub fn record_publish(outcome: &str, duration: Duration) {
    PUBLISH_TOTAL.with_label_values(&[outcome]).inc();
    PUBLISH_DURATION_SECONDS
        .with_label_values(&[outcome])
        .observe(duration.as_secs_f64());
}

pub fn record_pages_uploaded(count: usize) {
    PAGES_UPLOADED_TOTAL.inc_by(count as u64);
}

pub fn record_orphans_removed(count: usize) {
    ORPHANS_REMOVED_TOTAL.inc_by(count as u64);
}

pub fn record_media_upload(outcome: &str) {
    MEDIA_UPLOADS_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn record_distribution_created(outcome: &str) {
    DISTRIBUTIONS_CREATED_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn record_invalidation(outcome: &str) {
    INVALIDATIONS_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn record_teardown_failure(phase: &str) {
    TEARDOWN_FAILURES_TOTAL.with_label_values(&[phase]).inc();
}

/// Prometheus text exposition for `/metrics`
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return HttpResponse::InternalServerError().finish();
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
