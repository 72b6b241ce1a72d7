//! API error types.
//!
//! Every variant maps to an error kind surfaced in the JSON error payload.
//! The enum implements [`axum::response::IntoResponse`] so handlers can
//! simply return `Err(ApiError::PhotoNotFound { .. })`.
//!
//! Two families: client input errors (4xx) and storage errors (5xx).
//! Transient and permanent store failures are not distinguished.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Generate a 16-character hex request ID.
pub fn generate_request_id() -> String {
    let bytes: [u8; 8] = rand::random();
    hex::encode(bytes).to_uppercase()
}

/// API errors expressed as a Rust enum.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The multipart payload did not contain a `file` field.
    #[error("Missing required multipart field: file")]
    MissingFile,

    /// The uploaded file was present but empty.
    #[error("Uploaded file is empty")]
    EmptyFile,

    /// The multipart body could not be parsed.
    #[error("{message}")]
    InvalidMultipart { message: String },

    /// The upload exceeds the configured size limit.
    #[error("Uploaded file exceeds the maximum allowed size")]
    PayloadTooLarge,

    /// No photo record exists for the requested identifier.
    #[error("Photo not found")]
    PhotoNotFound { photo_id: String },

    /// A download link was presented with a bad or expired signature.
    #[error("Download link is invalid or has expired")]
    LinkDenied,

    /// A store operation failed (unreachable, denied, throttled).
    #[error("Storage operation failed, please try again")]
    Storage(#[from] anyhow::Error),
}

impl ApiError {
    /// Return the machine-readable error kind string.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::MissingFile => "missing_file",
            ApiError::EmptyFile => "empty_file",
            ApiError::InvalidMultipart { .. } => "invalid_multipart",
            ApiError::PayloadTooLarge => "payload_too_large",
            ApiError::PhotoNotFound { .. } => "not_found",
            ApiError::LinkDenied => "link_denied",
            ApiError::Storage(_) => "storage",
        }
    }

    /// Return the appropriate HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingFile => StatusCode::BAD_REQUEST,
            ApiError::EmptyFile => StatusCode::BAD_REQUEST,
            ApiError::InvalidMultipart { .. } => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::PhotoNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::LinkDenied => StatusCode::FORBIDDEN,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let request_id = generate_request_id();
        let status = self.status_code();
        let date = httpdate::fmt_http_date(std::time::SystemTime::now());

        let body = serde_json::json!({
            "error": {
                "kind": self.kind(),
                "message": self.to_string(),
            }
        });

        (
            status,
            [
                ("content-type", "application/json".to_string()),
                ("x-request-id", request_id),
                ("date", date),
                ("server", "PhotoVault".to_string()),
            ],
            body.to_string(),
        )
            .into_response()
    }
}

// -- Tests --------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_id_is_16_hex_chars() {
        let id = generate_request_id();
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(id, id.to_uppercase());
    }

    #[test]
    fn client_errors_map_to_4xx() {
        assert_eq!(ApiError::MissingFile.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::EmptyFile.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::PhotoNotFound {
                photo_id: "abc".into()
            }
            .status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::PayloadTooLarge.status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[test]
    fn storage_errors_map_to_5xx() {
        let err = ApiError::Storage(anyhow::anyhow!("dynamodb unreachable"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.kind(), "storage");
    }

    #[test]
    fn error_payload_is_machine_readable() {
        let err = ApiError::PhotoNotFound {
            photo_id: "missing-id".into(),
        };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response
                .headers()
                .get("content-type")
                .and_then(|v| v.to_str().ok()),
            Some("application/json")
        );
        assert!(response.headers().contains_key("x-request-id"));
    }
}
