//! Explorer observability metrics
//!
//! The library only records; installing an exporter is left to the binary.

use std::time::Duration;

/// Record a transport call
pub fn record_request(method: &str, path: &str, status: &str, duration: Duration) {
    metrics::counter!(
        "sumo_explorer_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string(),
    )
    .increment(1);

    metrics::histogram!(
        "sumo_explorer_request_duration_seconds",
        "method" => method.to_string(),
        "path" => path.to_string(),
    )
    .record(duration.as_secs_f64());
}

/// Record one page of search hits fetched for a collection
pub fn record_page_fetch(object_class: &str, hits: usize) {
    metrics::counter!(
        "sumo_explorer_page_fetches_total",
        "class" => object_class.to_string(),
    )
    .increment(1);

    metrics::histogram!(
        "sumo_explorer_page_hits",
        "class" => object_class.to_string(),
    )
    .record(hits as f64);
}

/// Record a remote aggregation request
pub fn record_aggregation(operation: &str, object_count: usize) {
    metrics::counter!(
        "sumo_explorer_aggregations_total",
        "operation" => operation.to_string(),
    )
    .increment(1);

    metrics::histogram!(
        "sumo_explorer_aggregation_objects",
        "operation" => operation.to_string(),
    )
    .record(object_count as f64);
}
