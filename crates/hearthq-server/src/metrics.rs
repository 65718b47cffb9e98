//! Prometheus metrics.
//!
//! Request-level metrics (counter, in-flight gauge, latency) are
//! recorded by a router middleware; produce/consume batch sizes are
//! reported by the handlers through the [`Metrics`] sink so the broker
//! core stays unaware of Prometheus. The no-op sink is the default and
//! the binary installs [`PrometheusMetrics`] when metrics are enabled.

use lazy_static::lazy_static;
use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Once;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

static INIT: Once = Once::new();

lazy_static! {
    /// Global Prometheus metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    /// Requests currently being served
    pub static ref IN_FLIGHT_REQUESTS: IntGauge = IntGauge::new(
        "hearthq_in_flight_requests",
        "Requests currently being served"
    ).expect("metric can be created");

    /// Completed requests by status code and method
    pub static ref API_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("hearthq_api_requests_total", "Completed API requests"),
        &["code", "method"]
    ).expect("metric can be created");

    /// Request latency
    pub static ref REQUEST_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new("hearthq_request_duration_seconds", "Request latency in seconds"),
        &["method"]
    ).expect("metric can be created");

    /// Messages per produce batch
    pub static ref PRODUCE_BATCH_SIZE: Histogram = Histogram::with_opts(
        HistogramOpts::new("hearthq_produce_batch_size", "Messages per produce request")
            .buckets(vec![10.0, 50.0, 100.0, 200.0, 500.0, 1000.0, 2000.0])
    ).expect("metric can be created");

    /// Messages per consume batch
    pub static ref CONSUME_BATCH_SIZE: Histogram = Histogram::with_opts(
        HistogramOpts::new("hearthq_consume_batch_size", "Messages per consume response")
            .buckets(vec![10.0, 50.0, 100.0, 200.0, 500.0, 1000.0, 2000.0])
    ).expect("metric can be created");
}

/// Register everything with the global registry. Idempotent.
pub fn init() {
    INIT.call_once(|| {
        REGISTRY
            .register(Box::new(IN_FLIGHT_REQUESTS.clone()))
            .expect("in_flight_requests can be registered");
        REGISTRY
            .register(Box::new(API_REQUESTS_TOTAL.clone()))
            .expect("api_requests_total can be registered");
        REGISTRY
            .register(Box::new(REQUEST_DURATION.clone()))
            .expect("request_duration can be registered");
        REGISTRY
            .register(Box::new(PRODUCE_BATCH_SIZE.clone()))
            .expect("produce_batch_size can be registered");
        REGISTRY
            .register(Box::new(CONSUME_BATCH_SIZE.clone()))
            .expect("consume_batch_size can be registered");
    });
}

/// Batch-size sink the handlers report through.
pub trait Metrics: Send + Sync {
    fn produce_msgs(&self, count: usize);
    fn consume_msgs(&self, count: usize);
}

/// Default sink: drops everything.
pub struct NoOpMetrics;

impl Metrics for NoOpMetrics {
    fn produce_msgs(&self, _count: usize) {}
    fn consume_msgs(&self, _count: usize) {}
}

/// Sink backed by the process-wide Prometheus histograms.
pub struct PrometheusMetrics;

impl Metrics for PrometheusMetrics {
    fn produce_msgs(&self, count: usize) {
        PRODUCE_BATCH_SIZE.observe(count as f64);
    }

    fn consume_msgs(&self, count: usize) {
        CONSUME_BATCH_SIZE.observe(count as f64);
    }
}

/// Router middleware recording the request-level metrics.
pub async fn track_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let start = Instant::now();
    IN_FLIGHT_REQUESTS.inc();
    let response = next.run(request).await;
    IN_FLIGHT_REQUESTS.dec();
    REQUEST_DURATION
        .with_label_values(&[method.as_str()])
        .observe(start.elapsed().as_secs_f64());
    API_REQUESTS_TOTAL
        .with_label_values(&[response.status().as_str(), method.as_str()])
        .inc();
    response
}

/// `GET /metrics` in Prometheus text exposition format.
pub async fn export() -> Response {
    let mut buf = Vec::new();
    let encoder = TextEncoder::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buf) {
        tracing::error!(error = %e, "failed to encode metrics");
        return axum::http::StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    ([("content-type", prometheus::TEXT_FORMAT)], buf).into_response()
}
