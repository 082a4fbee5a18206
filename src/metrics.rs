use lazy_static::lazy_static;
use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};
use std::sync::Once;
use std::time::{Duration, Instant};

use crate::Result;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    pub static ref SERVICE_UP: IntGauge =
        IntGauge::new("dashboard_up", "Whether the dashboard service is up (1) or down (0)").unwrap();

    // Query metrics
    pub static ref QUERY_REQUESTS: IntCounterVec = IntCounterVec::new(
        Opts::new("dashboard_queries_total", "Metric queries issued, by query"),
        &["query"]
    ).unwrap();

    pub static ref QUERY_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new("dashboard_query_failures_total", "Metric queries that failed, by query"),
        &["query"]
    ).unwrap();

    pub static ref QUERY_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new("dashboard_query_duration_seconds", "Metric query duration in seconds")
            .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 5.0]),
        &["query"]
    ).unwrap();

    pub static ref STALE_RESULTS: IntCounterVec = IntCounterVec::new(
        Opts::new("dashboard_stale_results_total", "Query results discarded because a newer fetch superseded them"),
        &["query"]
    ).unwrap();

    // HTTP metrics
    pub static ref REQUEST_COUNTER: IntCounter =
        IntCounter::new("http_requests_total", "Total number of HTTP requests received").unwrap();

    pub static ref REQUEST_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new("http_request_duration_seconds", "HTTP request duration in seconds")
            .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0])
    ).unwrap();
}

static INIT: Once = Once::new();

/// Registers every collector with [`REGISTRY`]. Safe to call more than once.
pub fn init_metrics() {
    INIT.call_once(|| {
        let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
            Box::new(SERVICE_UP.clone()),
            Box::new(QUERY_REQUESTS.clone()),
            Box::new(QUERY_FAILURES.clone()),
            Box::new(QUERY_DURATION.clone()),
            Box::new(STALE_RESULTS.clone()),
            Box::new(REQUEST_COUNTER.clone()),
            Box::new(REQUEST_DURATION.clone()),
        ];
        for collector in collectors {
            if let Err(e) = REGISTRY.register(collector) {
                tracing::warn!(error = %e, "failed to register collector");
            }
        }
        SERVICE_UP.set(1);
    });
}

/// Prometheus text exposition of [`REGISTRY`].
pub fn gather() -> Result<String> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| crate::DashboardError::Internal(e.to_string()))
}

pub fn record_query(query: &str, elapsed: Duration, ok: bool) {
    QUERY_REQUESTS.with_label_values(&[query]).inc();
    QUERY_DURATION
        .with_label_values(&[query])
        .observe(elapsed.as_secs_f64());
    if !ok {
        QUERY_FAILURES.with_label_values(&[query]).inc();
    }
}

pub fn record_stale_result(query: &str) {
    STALE_RESULTS.with_label_values(&[query]).inc();
}

pub struct RequestTimer {
    start: Instant,
}

impl RequestTimer {
    pub fn new() -> Self {
        REQUEST_COUNTER.inc();
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for RequestTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RequestTimer {
    fn drop(&mut self) {
        REQUEST_DURATION.observe(self.start.elapsed().as_secs_f64());
    }
}
