//! Axum router construction and route mapping.
//!
//! The [`app`] function wires every endpoint to its handler and returns a
//! ready-to-serve [`axum::Router`].

use axum::{
    extract::{
        multipart::MultipartRejection, rejection::QueryRejection, DefaultBodyLimit, Multipart,
        Path, Query, State,
    },
    http::{HeaderValue, Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::errors::{generate_request_id, ApiError};
use crate::handlers::photos::DownloadQuery;
use crate::metrics::{metrics_handler, metrics_middleware};
use crate::AppState;

// -- OpenAPI specification ----------------------------------------------------

/// OpenAPI documentation for the PhotoVault API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "PhotoVault API",
        version = "0.1.0",
        description = "Photo storage service with presigned download links"
    ),
    paths(
        health_check,
        crate::handlers::photos::upload_photo,
        crate::handlers::photos::get_photo,
        crate::handlers::photos::download_photo,
    ),
    components(schemas(
        crate::handlers::photos::UploadResponse,
        crate::handlers::photos::RetrieveResponse,
        crate::metadata::store::PhotoRecord,
    )),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Photos", description = "Photo upload and retrieval"),
    )
)]
struct ApiDoc;

/// Build the axum [`Router`] with all routes.
///
/// The returned router is ready to be passed to `axum::serve`.
pub fn app(state: Arc<AppState>) -> Router {
    let openapi = ApiDoc::openapi();

    // Allow room for multipart framing on top of the configured file limit.
    let body_limit = state.config.server.max_upload_size as usize + 64 * 1024;

    let mut router = Router::new()
        // Health check endpoint.
        .route("/health", get(health_check))
        // Photo API.
        .route("/photos", post(handle_upload_photo))
        .route("/photos/:photo_id", get(handle_get_photo))
        .route("/photos/:photo_id/content", get(handle_download_photo))
        // Swagger UI at /docs, OpenAPI spec at /openapi.json.
        .merge(SwaggerUi::new("/docs").url("/openapi.json", openapi));

    // The metrics endpoint only exists when the recorder is installed.
    if state.config.observability.metrics {
        router = router.route("/metrics", get(metrics_handler));
    }

    router
        // Application state shared across all handlers.
        .with_state(state)
        // Browser clients are served from other origins; answer CORS openly.
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        // common_headers_middleware adds standard response headers.
        .layer(middleware::from_fn(common_headers_middleware))
        // metrics_middleware is outer (captures full request lifecycle).
        .layer(middleware::from_fn(metrics_middleware))
        .layer(DefaultBodyLimit::max(body_limit))
}

// -- Common headers middleware -----------------------------------------------

/// Tower middleware that adds common response headers to every response:
/// - `x-request-id`: 16-character uppercase hex string
/// - `Date`: RFC 7231 formatted timestamp
/// - `Server`: `PhotoVault`
async fn common_headers_middleware(req: Request<axum::body::Body>, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    // Only set x-request-id if not already present (error responses set it).
    if !headers.contains_key("x-request-id") {
        let request_id = generate_request_id();
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            headers.insert("x-request-id", value);
        }
    }

    let date = httpdate::fmt_http_date(std::time::SystemTime::now());
    if let Ok(value) = HeaderValue::from_str(&date) {
        headers.insert("date", value);
    }
    headers.insert("server", HeaderValue::from_static("PhotoVault"));

    response
}

// -- Health check ------------------------------------------------------------

/// `GET /health` -- Returns `{"status": "ok"}` with 200 OK.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    operation_id = "HealthCheck",
    responses(
        (status = 200, description = "Health check OK")
    )
)]
async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "application/json")],
        r#"{"status":"ok"}"#,
    )
}

// -- Route handlers ----------------------------------------------------------

/// `POST /photos` -- UploadPhoto
///
/// The extractor rejection (wrong or missing `multipart/form-data`
/// content type) is mapped into the JSON error envelope like every
/// other client input error.
async fn handle_upload_photo(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let multipart = multipart.map_err(|rejection| ApiError::InvalidMultipart {
        message: rejection.body_text(),
    })?;
    let payload = crate::handlers::photos::parse_upload(multipart).await?;
    crate::handlers::photos::upload_photo(state, payload).await
}

/// `GET /photos/:photo_id` -- GetPhoto
async fn handle_get_photo(
    State(state): State<Arc<AppState>>,
    Path(photo_id): Path<String>,
) -> Result<Response, ApiError> {
    crate::handlers::photos::get_photo(state, &photo_id).await
}

/// `GET /photos/:photo_id/content` -- DownloadPhoto
///
/// A link whose query string does not parse (missing or non-numeric
/// `expires`, missing `signature`) is denied the same way a link with
/// a bad signature is.
async fn handle_download_photo(
    State(state): State<Arc<AppState>>,
    Path(photo_id): Path<String>,
    query: Result<Query<DownloadQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(|_| ApiError::LinkDenied)?;
    crate::handlers::photos::download_photo(state, &photo_id, &query).await
}

// -- Tests --------------------------------------------------------------------
