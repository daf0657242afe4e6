//! Prometheus metrics for request and database call tracking.
//!
//! This module provides metrics for:
//! - HTTP request counts and latency per route
//! - Database call counts, failures and latency per table/operation
//! - Records created and payloads rejected

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{debug, info};

use crate::error::BackendError;
use crate::records::Table;

// === Metric Name Constants ===

/// HTTP requests counter metric name.
pub const METRIC_HTTP_REQUESTS: &str = "http_requests_total";
/// HTTP request latency metric name.
pub const METRIC_HTTP_REQUEST_LATENCY: &str = "http_request_latency_ms";
/// Database requests counter metric name.
pub const METRIC_DB_REQUESTS: &str = "db_requests_total";
/// Database request failures counter metric name.
pub const METRIC_DB_FAILURES: &str = "db_request_failures_total";
/// Database request latency metric name.
pub const METRIC_DB_LATENCY: &str = "db_request_latency_ms";
/// Records created counter metric name.
pub const METRIC_RECORDS_CREATED: &str = "records_created_total";
/// Rejected creation payloads counter metric name.
pub const METRIC_VALIDATION_REJECTIONS: &str = "validation_rejections_total";

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_counter!(METRIC_HTTP_REQUESTS, "Total number of HTTP requests served");
    describe_histogram!(
        METRIC_HTTP_REQUEST_LATENCY,
        "HTTP request latency in milliseconds"
    );
    describe_counter!(METRIC_DB_REQUESTS, "Total number of database requests");
    describe_counter!(METRIC_DB_FAILURES, "Total number of failed database requests");
    describe_histogram!(METRIC_DB_LATENCY, "Database request latency in milliseconds");
    describe_counter!(METRIC_RECORDS_CREATED, "Total number of records created");
    describe_counter!(
        METRIC_VALIDATION_REJECTIONS,
        "Total number of creation payloads rejected for missing fields"
    );

    debug!("Metrics initialized");
}

/// Install the Prometheus exporter with its own HTTP listener.
pub fn install_exporter(addr: SocketAddr) -> Result<(), BackendError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    info!(%addr, "Prometheus exporter listening");
    Ok(())
}

/// Count a database request.
pub fn inc_db_requests(table: Table, op: &'static str) {
    counter!(METRIC_DB_REQUESTS, "table" => table.to_string(), "op" => op).increment(1);
}

/// Count a failed database request.
pub fn inc_db_failures(table: Table, op: &'static str) {
    counter!(METRIC_DB_FAILURES, "table" => table.to_string(), "op" => op).increment(1);
}

/// Count a created record.
pub fn inc_records_created(table: Table) {
    counter!(METRIC_RECORDS_CREATED, "table" => table.to_string()).increment(1);
}

/// Count a payload rejected for missing fields.
pub fn inc_validation_rejections(table: Table) {
    counter!(METRIC_VALIDATION_REJECTIONS, "table" => table.to_string()).increment(1);
}

/// RAII guard for timing database calls.
/// Automatically records latency when dropped.
pub struct LatencyTimer {
    start: Instant,
    table: Table,
    op: &'static str,
}

impl LatencyTimer {
    /// Start timing a database call.
    pub fn db(table: Table, op: &'static str) -> Self {
        Self {
            start: Instant::now(),
            table,
            op,
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        histogram!(METRIC_DB_LATENCY, "table" => self.table.to_string(), "op" => self.op)
            .record(self.elapsed_ms());
    }
}

/// Label used for requests answered by the router fallback.
pub const UNMATCHED_ROUTE: &str = "unmatched";

/// Route template for `req`, or [`UNMATCHED_ROUTE`].
pub fn route_label(req: &Request) -> String {
    req.extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_string())
}

/// Middleware recording a counter and latency per route.
///
/// Installed with `Router::layer` so router fallbacks are counted too.
pub async fn track_http(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let route = route_label(&req);

    let response = next.run(req).await;

    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    let status = response.status().as_u16().to_string();
    counter!(
        METRIC_HTTP_REQUESTS,
        "method" => method,
        "route" => route.clone(),
        "status" => status
    )
    .increment(1);
    histogram!(METRIC_HTTP_REQUEST_LATENCY, "route" => route).record(latency_ms);

    response
}
