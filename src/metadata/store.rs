//! Abstract metadata store trait.
//!
//! Any metadata backend must implement [`MetadataStore`].  The trait uses
//! manual desugaring with pinned futures so it can be used as a trait
//! object behind `Arc<dyn MetadataStore>`.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

/// Metadata record for one stored photo, the only entity in the system.
///
/// Created once at upload, never updated.  The record exists iff a binary
/// object with the same key exists in the object store, except during the
/// documented partial-failure window of an upload.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PhotoRecord {
    /// Primary key, generated server-side. Never supplied by the caller.
    pub photo_id: String,
    /// Original client-supplied name, used only for display.
    pub file_name: String,
    /// MIME type supplied by the caller or inferred from the file name.
    pub content_type: String,
    /// ISO-8601 ingestion timestamp.
    pub uploaded_at: String,
    /// Length of the stored binary in bytes.
    pub size: u64,
}

/// Async metadata store contract: put-by-key and get-by-key, nothing more.
pub trait MetadataStore: Send + Sync + 'static {
    /// Insert a photo record keyed by its `photo_id`.
    fn put_photo(
        &self,
        record: PhotoRecord,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>>;

    /// Get a photo record by id.
    fn get_photo(
        &self,
        photo_id: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Option<PhotoRecord>>> + Send + '_>>;
}

// -- Tests --------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_serializes_with_camel_case_fields() {
        let record = PhotoRecord {
            photo_id: "id-1".into(),
            file_name: "cat.png".into(),
            content_type: "image/png".into(),
            uploaded_at: "2026-01-01T00:00:00.000Z".into(),
            size: 1024,
        };
        let json = serde_json::to_value(&record).expect("serializes");
        assert_eq!(json["photoId"], "id-1");
        assert_eq!(json["fileName"], "cat.png");
        assert_eq!(json["contentType"], "image/png");
        assert_eq!(json["uploadedAt"], "2026-01-01T00:00:00.000Z");
        assert_eq!(json["size"], 1024);
    }
}
