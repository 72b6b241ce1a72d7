//! Photo API handlers: upload, retrieve, and self-served download.
//!
//! Both primary handlers are single-pass request/response operations with
//! at most two sequential store calls and no in-process shared state.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::Multipart;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::clock::format_iso8601;
use crate::errors::ApiError;
use crate::metadata::store::PhotoRecord;
use crate::metrics::{PHOTOS_UPLOADED_TOTAL, UPLOAD_BYTES_TOTAL};
use crate::AppState;

// -- Request/response types ----------------------------------------------------

/// Parsed upload form: the binary plus optional labeling fields.
#[derive(Debug)]
pub struct UploadPayload {
    /// Original file name, from the `fileName` field or the part's filename.
    pub file_name: Option<String>,
    /// MIME type, from the `contentType` field or the part's content type.
    pub content_type: Option<String>,
    /// The uploaded bytes.
    pub data: Bytes,
}

/// Body of a successful upload response.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Server-generated photo identifier.
    pub photo_id: String,
}

/// Body of a successful retrieve response.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RetrieveResponse {
    /// Photo identifier.
    pub photo_id: String,
    /// Original file name.
    pub file_name: String,
    /// MIME type.
    pub content_type: String,
    /// ISO-8601 ingestion timestamp.
    pub uploaded_at: String,
    /// Stored size in bytes.
    pub size: u64,
    /// Time-limited authorized download link.
    pub url: String,
}

/// Query parameters of a self-served download link.
#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    /// Absolute expiry, seconds since the Unix epoch.
    pub expires: u64,
    /// Hex HMAC-SHA256 signature.
    pub signature: String,
}

// -- Multipart parsing ---------------------------------------------------------

/// Parse the upload form.
///
/// The `file` field is required; `fileName` and `contentType` text fields
/// optionally override the part's own filename and content type.
pub async fn parse_upload(mut multipart: Multipart) -> Result<UploadPayload, ApiError> {
    let mut file: Option<(Option<String>, Option<String>, Bytes)> = None;
    let mut file_name_field: Option<String> = None;
    let mut content_type_field: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidMultipart {
            message: format!("Malformed multipart body: {e}"),
        })?
    {
        match field.name() {
            Some("file") => {
                let part_name = field.file_name().map(str::to_string);
                let part_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::InvalidMultipart {
                        message: format!("Failed to read file field: {e}"),
                    })?;
                file = Some((part_name, part_type, data));
            }
            Some("fileName") => {
                file_name_field =
                    Some(field.text().await.map_err(|e| ApiError::InvalidMultipart {
                        message: format!("Failed to read fileName field: {e}"),
                    })?);
            }
            Some("contentType") => {
                content_type_field =
                    Some(field.text().await.map_err(|e| ApiError::InvalidMultipart {
                        message: format!("Failed to read contentType field: {e}"),
                    })?);
            }
            _ => {
                // Drain and ignore unknown fields.
                let _ = field.bytes().await;
            }
        }
    }

    let (part_name, part_type, data) = file.ok_or(ApiError::MissingFile)?;

    Ok(UploadPayload {
        file_name: file_name_field.or(part_name),
        content_type: content_type_field.or(part_type),
        data,
    })
}

/// Infer a MIME type from a file name's extension.
///
/// Falls back to `application/octet-stream` for unknown extensions.
pub fn infer_content_type(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

// -- Upload --------------------------------------------------------------------

/// `POST /photos`: store a photo and return its identifier.
///
/// Two externally visible writes, in order: binary to the object store,
/// then the record to the metadata store.  The writes are not
/// transactional: a metadata failure after a successful object write
/// leaves an orphaned object, which is logged but not compensated.
#[utoipa::path(
    post,
    path = "/photos",
    tag = "Photos",
    operation_id = "UploadPhoto",
    responses(
        (status = 201, description = "Photo stored", body = UploadResponse),
        (status = 400, description = "Missing or empty file"),
        (status = 413, description = "File too large"),
        (status = 500, description = "Storage failure"),
    )
)]
pub async fn upload_photo(
    state: Arc<AppState>,
    payload: UploadPayload,
) -> Result<Response, ApiError> {
    if payload.data.is_empty() {
        return Err(ApiError::EmptyFile);
    }
    if payload.data.len() as u64 > state.config.server.max_upload_size {
        return Err(ApiError::PayloadTooLarge);
    }

    let file_name = payload.file_name.unwrap_or_else(|| "photo".to_string());
    let content_type = payload
        .content_type
        .unwrap_or_else(|| infer_content_type(&file_name).to_string());
    let size = payload.data.len() as u64;

    // No uniqueness check: the id carries enough entropy to treat as unique.
    let photo_id = state.ids.generate();

    info!(photo_id = %photo_id, size, "uploading photo");

    state
        .storage
        .put(&photo_id, payload.data, &content_type)
        .await?;

    let record = PhotoRecord {
        photo_id: photo_id.clone(),
        file_name,
        content_type,
        uploaded_at: format_iso8601(state.clock.now()),
        size,
    };

    if let Err(e) = state.metadata.put_photo(record).await {
        // The object write already committed and is not retracted.
        warn!(photo_id = %photo_id, error = %e, "metadata write failed, object is orphaned");
        return Err(ApiError::Storage(e));
    }

    counter!(PHOTOS_UPLOADED_TOTAL).increment(1);
    counter!(UPLOAD_BYTES_TOTAL).increment(size);

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse { photo_id }),
    )
        .into_response())
}

// -- Retrieve ------------------------------------------------------------------

/// `GET /photos/{photoId}`: return the record plus a time-limited link.
///
/// Link generation is pure signing against the store's key and expiry.
/// Unless `retrieval.verify_object_exists` is enabled, the object's
/// existence is not checked before signing; a link to an out-of-band
/// deleted object fails only when dereferenced.
#[utoipa::path(
    get,
    path = "/photos/{photo_id}",
    tag = "Photos",
    operation_id = "GetPhoto",
    params(("photo_id" = String, Path, description = "Photo identifier")),
    responses(
        (status = 200, description = "Record and download link", body = RetrieveResponse),
        (status = 404, description = "Unknown photo id"),
        (status = 500, description = "Link generation failure"),
    )
)]
pub async fn get_photo(state: Arc<AppState>, photo_id: &str) -> Result<Response, ApiError> {
    let record = state
        .metadata
        .get_photo(photo_id)
        .await?
        .ok_or_else(|| ApiError::PhotoNotFound {
            photo_id: photo_id.to_string(),
        })?;

    if state.config.retrieval.verify_object_exists && !state.storage.exists(photo_id).await? {
        warn!(photo_id = %photo_id, "record references a missing object");
        return Err(ApiError::PhotoNotFound {
            photo_id: photo_id.to_string(),
        });
    }

    let ttl = Duration::from_secs(state.config.retrieval.url_ttl_seconds);
    let url = state.storage.presign_get(photo_id, ttl).await?;

    Ok(Json(RetrieveResponse {
        photo_id: record.photo_id,
        file_name: record.file_name,
        content_type: record.content_type,
        uploaded_at: record.uploaded_at,
        size: record.size,
        url,
    })
    .into_response())
}

// -- Download (self-served links) ----------------------------------------------

/// `GET /photos/{photoId}/content`: serve photo bytes for self-signed links.
///
/// Only links minted by the local and in-memory backends point here; the
/// S3 backend's links go straight to S3.  The signature covers the photo
/// id and expiry, verified in constant time against the configured secret.
#[utoipa::path(
    get,
    path = "/photos/{photo_id}/content",
    tag = "Photos",
    operation_id = "DownloadPhoto",
    params(
        ("photo_id" = String, Path, description = "Photo identifier"),
        ("expires" = u64, Query, description = "Link expiry (Unix seconds)"),
        ("signature" = String, Query, description = "Link signature"),
    ),
    responses(
        (status = 200, description = "Photo bytes"),
        (status = 403, description = "Invalid or expired link"),
        (status = 404, description = "Unknown photo id"),
    )
)]
pub async fn download_photo(
    state: Arc<AppState>,
    photo_id: &str,
    query: &DownloadQuery,
) -> Result<Response, ApiError> {
    let valid = crate::sign::verify(
        &state.config.retrieval.signing_secret,
        photo_id,
        query.expires,
        &query.signature,
        state.clock.unix_now(),
    );
    if !valid {
        return Err(ApiError::LinkDenied);
    }

    let record = state
        .metadata
        .get_photo(photo_id)
        .await?
        .ok_or_else(|| ApiError::PhotoNotFound {
            photo_id: photo_id.to_string(),
        })?;

    let data = state.storage.get(photo_id).await?;

    Ok((
        StatusCode::OK,
        [
            ("content-type", record.content_type),
            ("content-length", data.len().to_string()),
        ],
        data,
    )
        .into_response())
}

// -- Tests --------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, FixedClock};
    use crate::config::Config;
    use crate::id::{IdGenerator, UuidGenerator};
    use crate::metadata::memory::MemoryMetadataStore;
    use crate::metadata::store::{MetadataStore, PhotoRecord};
    use crate::storage::memory::MemoryObjectStore;
    use crate::storage::object::ObjectStore;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const NOW: u64 = 1_750_000_000;
    const SECRET: &str = "photovault-dev-secret";

    /// Deterministic id generator emitting photo-0, photo-1, ...
    struct SequenceIds(AtomicUsize);

    impl IdGenerator for SequenceIds {
        fn generate(&self) -> String {
            format!("photo-{}", self.0.fetch_add(1, Ordering::SeqCst))
        }
    }

    /// Metadata store whose writes always fail.
    struct FailingMetadataStore;

    impl MetadataStore for FailingMetadataStore {
        fn put_photo(
            &self,
            _record: PhotoRecord,
        ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>> {
            Box::pin(async { Err(anyhow::anyhow!("metadata table throttled")) })
        }

        fn get_photo(
            &self,
            _photo_id: &str,
        ) -> Pin<Box<dyn Future<Output = anyhow::Result<Option<PhotoRecord>>> + Send + '_>>
        {
            Box::pin(async { Ok(None) })
        }
    }

    fn test_state() -> Arc<AppState> {
        test_state_with(
            Arc::new(MemoryMetadataStore::new()),
            Arc::new(SequenceIds(AtomicUsize::new(0))),
            Config::default(),
        )
    }

    fn test_state_with(
        metadata: Arc<dyn MetadataStore>,
        ids: Arc<dyn IdGenerator>,
        config: Config,
    ) -> Arc<AppState> {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::at_unix(NOW));
        let storage = Arc::new(MemoryObjectStore::new(
            &config.retrieval.public_url,
            SECRET,
            clock.clone(),
        ));
        Arc::new(AppState {
            config,
            metadata,
            storage,
            ids,
            clock,
        })
    }

    fn png_payload(bytes: &'static [u8]) -> UploadPayload {
        UploadPayload {
            file_name: Some("cat.png".to_string()),
            content_type: Some("image/png".to_string()),
            data: Bytes::from_static(bytes),
        }
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn upload_then_retrieve_round_trips() {
        let state = test_state();
        let data: &'static [u8] = &[7u8; 1024];

        let response = upload_photo(state.clone(), png_payload(data)).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let uploaded = body_json(response).await;
        assert_eq!(uploaded["photoId"], "photo-0");

        let response = get_photo(state, "photo-0").await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let retrieved = body_json(response).await;
        assert_eq!(retrieved["fileName"], "cat.png");
        assert_eq!(retrieved["contentType"], "image/png");
        assert_eq!(retrieved["size"], 1024);
        assert!(retrieved["url"].as_str().unwrap().contains("photo-0"));
    }

    #[tokio::test]
    async fn uuid_ids_are_36_chars_in_responses() {
        let state = test_state_with(
            Arc::new(MemoryMetadataStore::new()),
            Arc::new(UuidGenerator),
            Config::default(),
        );
        let response = upload_photo(state, png_payload(b"x")).await.unwrap();
        let body = body_json(response).await;
        assert_eq!(body["photoId"].as_str().unwrap().len(), 36);
    }

    #[tokio::test]
    async fn retrieve_unknown_id_is_not_found() {
        let state = test_state();
        let err = get_photo(state, "never-uploaded").await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.kind(), "not_found");
    }

    #[tokio::test]
    async fn empty_upload_is_rejected_without_store_writes() {
        let metadata = Arc::new(MemoryMetadataStore::new());
        let state = test_state_with(
            metadata.clone(),
            Arc::new(SequenceIds(AtomicUsize::new(0))),
            Config::default(),
        );
        let storage = state.storage.clone();

        let payload = UploadPayload {
            file_name: Some("empty.png".to_string()),
            content_type: None,
            data: Bytes::new(),
        };
        let err = upload_photo(state, payload).await.unwrap_err();
        assert_eq!(err.kind(), "empty_file");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        // Neither store saw a write.
        assert!(metadata.is_empty());
        assert!(!storage.exists("photo-0").await.unwrap());
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected() {
        let mut config = Config::default();
        config.server.max_upload_size = 8;
        let state = test_state_with(
            Arc::new(MemoryMetadataStore::new()),
            Arc::new(SequenceIds(AtomicUsize::new(0))),
            config,
        );

        let err = upload_photo(state, png_payload(&[0u8; 9])).await.unwrap_err();
        assert_eq!(err.kind(), "payload_too_large");
    }

    #[tokio::test]
    async fn concurrent_uploads_get_distinct_ids() {
        let state = test_state_with(
            Arc::new(MemoryMetadataStore::new()),
            Arc::new(UuidGenerator),
            Config::default(),
        );

        let (a, b) = tokio::join!(
            upload_photo(state.clone(), png_payload(b"first")),
            upload_photo(state.clone(), png_payload(b"second")),
        );
        let id_a = body_json(a.unwrap()).await["photoId"]
            .as_str()
            .unwrap()
            .to_string();
        let id_b = body_json(b.unwrap()).await["photoId"]
            .as_str()
            .unwrap()
            .to_string();
        assert_ne!(id_a, id_b);

        // Each is independently retrievable.
        assert!(get_photo(state.clone(), &id_a).await.is_ok());
        assert!(get_photo(state, &id_b).await.is_ok());
    }

    #[tokio::test]
    async fn link_expiry_is_request_time_plus_configured_ttl() {
        let mut config = Config::default();
        config.retrieval.url_ttl_seconds = 3600;
        let state = test_state_with(
            Arc::new(MemoryMetadataStore::new()),
            Arc::new(SequenceIds(AtomicUsize::new(0))),
            config,
        );

        upload_photo(state.clone(), png_payload(b"x")).await.unwrap();
        let body = body_json(get_photo(state, "photo-0").await.unwrap()).await;
        let url = body["url"].as_str().unwrap();
        assert!(url.contains(&format!("expires={}", NOW + 3600)));
    }

    #[tokio::test]
    async fn metadata_failure_after_object_write_reports_storage_error() {
        let state = test_state_with(
            Arc::new(FailingMetadataStore),
            Arc::new(SequenceIds(AtomicUsize::new(0))),
            Config::default(),
        );
        let storage = state.storage.clone();

        let err = upload_photo(state, png_payload(b"orphan")).await.unwrap_err();
        assert_eq!(err.kind(), "storage");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        // No rollback: the object write already committed.
        assert!(storage.exists("photo-0").await.unwrap());
    }

    #[tokio::test]
    async fn verify_object_exists_flag_rejects_orphaned_records() {
        let metadata = Arc::new(MemoryMetadataStore::new());
        metadata
            .put_photo(PhotoRecord {
                photo_id: "dangling".into(),
                file_name: "gone.png".into(),
                content_type: "image/png".into(),
                uploaded_at: "2026-01-01T00:00:00.000Z".into(),
                size: 3,
            })
            .await
            .unwrap();

        // Default: the record is trusted and a link is minted anyway.
        let state = test_state_with(
            metadata.clone(),
            Arc::new(SequenceIds(AtomicUsize::new(0))),
            Config::default(),
        );
        assert!(get_photo(state, "dangling").await.is_ok());

        // With verification on, the orphaned record answers not-found.
        let mut config = Config::default();
        config.retrieval.verify_object_exists = true;
        let state = test_state_with(
            metadata,
            Arc::new(SequenceIds(AtomicUsize::new(0))),
            config,
        );
        let err = get_photo(state, "dangling").await.unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[tokio::test]
    async fn download_serves_bytes_for_valid_link() {
        let state = test_state();
        upload_photo(state.clone(), png_payload(b"pixels")).await.unwrap();

        let expires = NOW + 60;
        let query = DownloadQuery {
            expires,
            signature: crate::sign::compute_signature(SECRET, "photo-0", expires),
        };
        let response = download_photo(state, "photo-0", &query).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get("content-type")
                .and_then(|v| v.to_str().ok()),
            Some("image/png")
        );
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"pixels");
    }

    #[tokio::test]
    async fn download_rejects_bad_signature() {
        let state = test_state();
        upload_photo(state.clone(), png_payload(b"pixels")).await.unwrap();

        let query = DownloadQuery {
            expires: NOW + 60,
            signature: "0".repeat(64),
        };
        let err = download_photo(state, "photo-0", &query).await.unwrap_err();
        assert_eq!(err.kind(), "link_denied");
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn download_rejects_expired_link() {
        let state = test_state();
        upload_photo(state.clone(), png_payload(b"pixels")).await.unwrap();

        let expires = NOW - 1;
        let query = DownloadQuery {
            expires,
            signature: crate::sign::compute_signature(SECRET, "photo-0", expires),
        };
        let err = download_photo(state, "photo-0", &query).await.unwrap_err();
        assert_eq!(err.kind(), "link_denied");
    }

    #[test]
    fn content_type_inference_matches_known_extensions() {
        assert_eq!(infer_content_type("a.jpg"), "image/jpeg");
        assert_eq!(infer_content_type("a.JPEG"), "image/jpeg");
        assert_eq!(infer_content_type("a.png"), "image/png");
        assert_eq!(infer_content_type("a.gif"), "image/gif");
        assert_eq!(infer_content_type("a.bmp"), "image/bmp");
        assert_eq!(infer_content_type("a.webp"), "image/webp");
        assert_eq!(infer_content_type("a.svg"), "image/svg+xml");
        assert_eq!(infer_content_type("a.tiff"), "application/octet-stream");
        assert_eq!(infer_content_type("noext"), "application/octet-stream");
    }

    #[tokio::test]
    async fn upload_without_content_type_infers_from_file_name() {
        let state = test_state();
        let payload = UploadPayload {
            file_name: Some("holiday.webp".to_string()),
            content_type: None,
            data: Bytes::from_static(b"img"),
        };
        upload_photo(state.clone(), payload).await.unwrap();

        let body = body_json(get_photo(state, "photo-0").await.unwrap()).await;
        assert_eq!(body["contentType"], "image/webp");
    }
}
