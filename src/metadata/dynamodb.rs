//! AWS DynamoDB metadata store backend.
//!
//! One item per photo, keyed by `photoId`.  Attribute names match the
//! record's wire names so items stay readable from the console:
//! `photoId`, `fileName`, `contentType`, `uploadedAt`, `size`.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use tracing::debug;

use super::store::{MetadataStore, PhotoRecord};
use crate::config::DynamoDbConfig;

pub struct DynamoDbMetadataStore {
    client: Client,
    table_name: String,
}

impl DynamoDbMetadataStore {
    /// Create a new DynamoDB metadata store.
    ///
    /// Credentials are resolved via the standard AWS credential chain
    /// (env vars, `~/.aws/credentials`, IAM role, etc.).
    pub async fn new(config: &DynamoDbConfig) -> anyhow::Result<Self> {
        let mut builder = aws_config::defaults(aws_config::BehaviorVersion::latest());

        if !config.region.is_empty() {
            builder = builder.region(aws_config::Region::new(config.region.clone()));
        }
        if !config.endpoint_url.is_empty() {
            builder = builder.endpoint_url(&config.endpoint_url);
        }

        let sdk_config = builder.load().await;
        let client = Client::new(&sdk_config);

        Ok(Self {
            client,
            table_name: config.table.clone(),
        })
    }

    /// Map an AWS SDK error to an anyhow error with context.
    fn map_sdk_error(context: &str, err: impl std::fmt::Display) -> anyhow::Error {
        anyhow::anyhow!("DynamoDB {context}: {err}")
    }
}

fn record_to_item(record: &PhotoRecord) -> HashMap<String, AttributeValue> {
    let mut item = HashMap::new();
    item.insert(
        "photoId".to_string(),
        AttributeValue::S(record.photo_id.clone()),
    );
    item.insert(
        "fileName".to_string(),
        AttributeValue::S(record.file_name.clone()),
    );
    item.insert(
        "contentType".to_string(),
        AttributeValue::S(record.content_type.clone()),
    );
    item.insert(
        "uploadedAt".to_string(),
        AttributeValue::S(record.uploaded_at.clone()),
    );
    item.insert(
        "size".to_string(),
        AttributeValue::N(record.size.to_string()),
    );
    item
}

fn item_to_record(item: &HashMap<String, AttributeValue>) -> PhotoRecord {
    let get_s = |name: &str| -> String {
        item.get(name)
            .and_then(|v| v.as_s().ok())
            .cloned()
            .unwrap_or_default()
    };
    let size = item
        .get("size")
        .and_then(|v| v.as_n().ok())
        .and_then(|n| n.parse::<u64>().ok())
        .unwrap_or_default();

    PhotoRecord {
        photo_id: get_s("photoId"),
        file_name: get_s("fileName"),
        content_type: get_s("contentType"),
        uploaded_at: get_s("uploadedAt"),
        size,
    }
}

impl MetadataStore for DynamoDbMetadataStore {
    fn put_photo(
        &self,
        record: PhotoRecord,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>> {
        Box::pin(async move {
            debug!(
                "DynamoDB put_item: table={} photoId={}",
                self.table_name, record.photo_id
            );

            self.client
                .put_item()
                .table_name(&self.table_name)
                .set_item(Some(record_to_item(&record)))
                .send()
                .await
                .map_err(|e| Self::map_sdk_error("put_item", e))?;

            Ok(())
        })
    }

    fn get_photo(
        &self,
        photo_id: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Option<PhotoRecord>>> + Send + '_>> {
        let photo_id = photo_id.to_string();
        Box::pin(async move {
            debug!(
                "DynamoDB get_item: table={} photoId={}",
                self.table_name, photo_id
            );

            let result = self
                .client
                .get_item()
                .table_name(&self.table_name)
                .key("photoId", AttributeValue::S(photo_id))
                .send()
                .await
                .map_err(|e| Self::map_sdk_error("get_item", e))?;

            Ok(result.item().map(item_to_record))
        })
    }
}

// -- Tests --------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> PhotoRecord {
        PhotoRecord {
            photo_id: "id-1".into(),
            file_name: "cat.png".into(),
            content_type: "image/png".into(),
            uploaded_at: "2026-01-01T00:00:00.000Z".into(),
            size: 1024,
        }
    }

    #[test]
    fn item_mapping_round_trips() {
        let record = sample_record();
        let item = record_to_item(&record);
        let back = item_to_record(&item);
        assert_eq!(back.photo_id, record.photo_id);
        assert_eq!(back.file_name, record.file_name);
        assert_eq!(back.content_type, record.content_type);
        assert_eq!(back.uploaded_at, record.uploaded_at);
        assert_eq!(back.size, record.size);
    }

    #[test]
    fn size_is_stored_as_number() {
        let item = record_to_item(&sample_record());
        assert!(matches!(item.get("size"), Some(AttributeValue::N(n)) if n == "1024"));
    }

    #[test]
    fn missing_attributes_fall_back_to_defaults() {
        let mut item = HashMap::new();
        item.insert("photoId".to_string(), AttributeValue::S("id-9".into()));
        let record = item_to_record(&item);
        assert_eq!(record.photo_id, "id-9");
        assert_eq!(record.file_name, "");
        assert_eq!(record.size, 0);
    }
}
