//! Prometheus metrics for the API server.

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Initialize the Prometheus metrics recorder.
pub fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "vtts_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "vtts_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "vtts_http_requests_in_flight";

    // Composition metrics
    pub const COMPOSITIONS_TOTAL: &str = "vtts_compositions_total";
    pub const COMPOSITION_DURATION_SECONDS: &str = "vtts_composition_duration_seconds";
    pub const SEGMENTS_COMPOSED_TOTAL: &str = "vtts_segments_composed_total";
    pub const OUTPUT_AUDIO_SECONDS: &str = "vtts_output_audio_seconds";

    // Engine metrics
    pub const ENGINE_REQUESTS_TOTAL: &str = "vtts_engine_requests_total";
    pub const ENGINE_REQUEST_DURATION_SECONDS: &str = "vtts_engine_request_duration_seconds";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "vtts_rate_limit_hits_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a completed composition.
pub fn record_composition(segments: usize, output_secs: f64, duration_secs: f64) {
    counter!(names::COMPOSITIONS_TOTAL).increment(1);
    counter!(names::SEGMENTS_COMPOSED_TOTAL).increment(segments as u64);
    histogram!(names::OUTPUT_AUDIO_SECONDS).record(output_secs);
    histogram!(names::COMPOSITION_DURATION_SECONDS).record(duration_secs);
}

/// Record an engine round-trip.
pub fn record_engine_request(operation: &str, duration_secs: f64) {
    let labels = [("operation", operation.to_string())];
    counter!(names::ENGINE_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::ENGINE_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", endpoint.to_string())];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

/// Sanitize path for metrics labels (collapse per-file segments).
fn sanitize_path(path: &str) -> String {
    let path = regex_lite::Regex::new(r"/outputs/[^/]+")
        .unwrap()
        .replace_all(path, "/outputs/:filename");
    let path = regex_lite::Regex::new(r"/voices/[^/]+")
        .unwrap()
        .replace_all(&path, "/voices/:name");
    path.to_string()
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path() {
        assert_eq!(
            sanitize_path("/api/outputs/concat_20250110_1a2b.wav"),
            "/api/outputs/:filename"
        );
        assert_eq!(sanitize_path("/api/voices/narrator"), "/api/voices/:name");
        assert_eq!(
            sanitize_path("/api/audio/concatenate"),
            "/api/audio/concatenate"
        );
    }
}
