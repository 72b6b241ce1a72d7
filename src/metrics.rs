//! Prometheus metrics for PhotoVault.
//!
//! Installs a global Prometheus recorder using `metrics-exporter-prometheus`,
//! defines metric name constants, provides a Tower-compatible middleware for
//! HTTP RED metrics, and exposes the `/metrics` endpoint handler.

use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Instant;

// -- Metric name constants ----------------------------------------------------

/// Total HTTP requests (counter). Labels: method, path, status.
pub const HTTP_REQUESTS_TOTAL: &str = "photovault_http_requests_total";

/// HTTP request duration in seconds (histogram). Labels: method, path.
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "photovault_http_request_duration_seconds";

/// Total photos successfully uploaded (counter).
pub const PHOTOS_UPLOADED_TOTAL: &str = "photovault_photos_uploaded_total";

/// Total bytes accepted in uploads (counter).
pub const UPLOAD_BYTES_TOTAL: &str = "photovault_upload_bytes_total";

// -- Global recorder installation ---------------------------------------------

/// Singleton handle to the Prometheus recorder.
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the global Prometheus metrics recorder. Idempotent -- safe to call
/// multiple times (e.g. in tests). Returns a reference to the global handle.
pub fn init_metrics() -> &'static PrometheusHandle {
    PROMETHEUS_HANDLE.get_or_init(|| {
        PrometheusBuilder::new()
            .install_recorder()
            .expect("failed to install Prometheus recorder")
    })
}

/// Register metric descriptions with the global recorder. Call once after
/// `init_metrics()`.
pub fn describe_metrics() {
    describe_counter!(HTTP_REQUESTS_TOTAL, "Total HTTP requests");
    describe_histogram!(
        HTTP_REQUEST_DURATION_SECONDS,
        "HTTP request duration in seconds"
    );
    describe_counter!(PHOTOS_UPLOADED_TOTAL, "Total photos uploaded");
    describe_counter!(UPLOAD_BYTES_TOTAL, "Total bytes accepted in uploads");
}

// -- Metrics middleware -------------------------------------------------------

/// Axum middleware that records HTTP RED metrics for every request.
///
/// Excludes `/metrics` from self-instrumentation to avoid feedback loops.
/// Must be the outermost layer so it captures the full request lifecycle.
pub async fn metrics_middleware(
    req: Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> Response {
    // Do not instrument the metrics endpoint itself.
    if req.uri().path() == "/metrics" {
        return next.run(req).await;
    }

    let method = req.method().to_string();
    let path = normalize_path(req.uri().path());

    let start = Instant::now();
    let response = next.run(req).await;
    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    counter!(HTTP_REQUESTS_TOTAL, "method" => method.clone(), "path" => path.clone(), "status" => status).increment(1);
    histogram!(HTTP_REQUEST_DURATION_SECONDS, "method" => method, "path" => path).record(duration);

    response
}

// -- Path normalization -------------------------------------------------------

/// Normalize an actual request path to a route template for metric labels.
///
/// This prevents high-cardinality labels from unique photo ids.
///
/// Examples:
/// - `/health` -> `/health`
/// - `/photos` -> `/photos`
/// - `/photos/5f2e...` -> `/photos/{photoId}`
/// - `/photos/5f2e.../content` -> `/photos/{photoId}/content`
fn normalize_path(path: &str) -> String {
    match path {
        "/" | "/health" | "/docs" | "/openapi.json" | "/metrics" | "/photos" => path.to_string(),
        _ => {
            let mut segments = path.trim_start_matches('/').split('/');
            match (segments.next(), segments.next(), segments.next()) {
                (Some("photos"), Some(_), None) => "/photos/{photoId}".to_string(),
                (Some("photos"), Some(_), Some("content")) => {
                    "/photos/{photoId}/content".to_string()
                }
                _ => "/other".to_string(),
            }
        }
    }
}

// -- Metrics endpoint handler -------------------------------------------------

/// `GET /metrics` -- Render Prometheus exposition format text.
///
/// Answers 404 when the recorder was never installed (metrics disabled
/// in config); the route itself is also omitted in that case.
pub async fn metrics_handler() -> Response {
    match PROMETHEUS_HANDLE.get() {
        Some(handle) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

// -- Tests --------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_static_routes() {
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path("/health"), "/health");
        assert_eq!(normalize_path("/metrics"), "/metrics");
        assert_eq!(normalize_path("/photos"), "/photos");
    }

    #[test]
    fn test_normalize_path_photo_id() {
        assert_eq!(
            normalize_path("/photos/5f2e9c1a-0000-4000-8000-aaaaaaaaaaaa"),
            "/photos/{photoId}"
        );
    }

    #[test]
    fn test_normalize_path_photo_content() {
        assert_eq!(
            normalize_path("/photos/some-id/content"),
            "/photos/{photoId}/content"
        );
    }

    #[test]
    fn test_normalize_path_unknown() {
        assert_eq!(normalize_path("/favicon.ico"), "/other");
        assert_eq!(normalize_path("/photos/a/b/c"), "/other");
    }

    // No test in this crate installs the recorder, so the handle stays
    // unset for the whole test process.
    #[tokio::test]
    async fn handler_without_recorder_answers_not_found() {
        let response = metrics_handler().await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
