//! AWS S3 object store.
//!
//! Stores photos in a real S3 bucket.  Photos live under
//! `{prefix}{photo_id}`; download links are SDK-presigned GetObject URLs.
//!
//! Credentials are resolved via the standard AWS credential chain
//! (env vars, `~/.aws/credentials`, IAM role, etc.).

use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client;
use bytes::Bytes;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tracing::debug;

use super::object::ObjectStore;
use crate::config::S3StorageConfig;

pub struct S3ObjectStore {
    /// AWS S3 SDK client.
    client: Client,
    /// The backing S3 bucket name.
    bucket: String,
    /// Key prefix for all photos in the backing bucket.
    prefix: String,
}

impl S3ObjectStore {
    /// Create a new S3 object store.
    pub async fn new(config: &S3StorageConfig) -> anyhow::Result<Self> {
        let mut config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()));

        if !config.endpoint_url.is_empty() {
            config_loader = config_loader.endpoint_url(&config.endpoint_url);
        }

        let sdk_config = config_loader.load().await;

        let s3_config_builder =
            aws_sdk_s3::config::Builder::from(&sdk_config).force_path_style(config.use_path_style);

        let client = Client::from_conf(s3_config_builder.build());

        Ok(Self {
            client,
            bucket: config.bucket.clone(),
            prefix: config.prefix.clone(),
        })
    }

    /// Map a photo id to an upstream S3 key.
    fn s3_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Map an AWS SDK error to an anyhow error with context.
    fn map_sdk_error(context: &str, err: impl std::fmt::Display) -> anyhow::Error {
        anyhow::anyhow!("AWS S3 {context}: {err}")
    }
}

impl ObjectStore for S3ObjectStore {
    fn put(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>> {
        let key = key.to_string();
        let content_type = content_type.to_string();
        Box::pin(async move {
            let s3_key = self.s3_key(&key);

            debug!("S3 put_object: bucket={} key={}", self.bucket, s3_key);

            self.client
                .put_object()
                .bucket(&self.bucket)
                .key(&s3_key)
                .content_type(&content_type)
                .body(aws_sdk_s3::primitives::ByteStream::from(data))
                .send()
                .await
                .map_err(|e| Self::map_sdk_error("put_object", e))?;

            Ok(())
        })
    }

    fn get(
        &self,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Bytes>> + Send + '_>> {
        let key = key.to_string();
        Box::pin(async move {
            let s3_key = self.s3_key(&key);

            debug!("S3 get_object: bucket={} key={}", self.bucket, s3_key);

            let resp = self
                .client
                .get_object()
                .bucket(&self.bucket)
                .key(&s3_key)
                .send()
                .await
                .map_err(|e| {
                    let service_err = e.into_service_error();
                    if service_err.is_no_such_key() {
                        anyhow::anyhow!("Object not found at key: {key}")
                    } else {
                        Self::map_sdk_error("get_object", service_err)
                    }
                })?;

            let body_bytes = resp
                .body
                .collect()
                .await
                .map_err(|e| Self::map_sdk_error("get_object body", e))?
                .into_bytes();

            Ok(Bytes::from(body_bytes.to_vec()))
        })
    }

    fn exists(
        &self,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<bool>> + Send + '_>> {
        let key = key.to_string();
        Box::pin(async move {
            let s3_key = self.s3_key(&key);

            debug!("S3 head_object: bucket={} key={}", self.bucket, s3_key);

            match self
                .client
                .head_object()
                .bucket(&self.bucket)
                .key(&s3_key)
                .send()
                .await
            {
                Ok(_) => Ok(true),
                Err(e) => {
                    let service_err = e.into_service_error();
                    if service_err.is_not_found() {
                        Ok(false)
                    } else {
                        Err(Self::map_sdk_error("head_object", service_err))
                    }
                }
            }
        })
    }

    fn presign_get(
        &self,
        key: &str,
        ttl: Duration,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + '_>> {
        let key = key.to_string();
        Box::pin(async move {
            let s3_key = self.s3_key(&key);

            debug!(
                "S3 presign get_object: bucket={} key={} ttl={}s",
                self.bucket,
                s3_key,
                ttl.as_secs()
            );

            let presigning = PresigningConfig::expires_in(ttl)
                .map_err(|e| Self::map_sdk_error("presigning config", e))?;

            let presigned = self
                .client
                .get_object()
                .bucket(&self.bucket)
                .key(&s3_key)
                .presigned(presigning)
                .await
                .map_err(|e| Self::map_sdk_error("presign get_object", e))?;

            Ok(presigned.uri().to_string())
        })
    }
}

// -- Tests --------------------------------------------------------------------

#[cfg(test)]
mod tests {
    // A full S3ObjectStore needs AWS credentials; unit tests cover the key
    // mapping formula only.

    #[test]
    fn key_mapping_with_prefix() {
        let prefix = "photos/";
        let key = "5f2e9c1a-0000-4000-8000-aaaaaaaaaaaa";
        assert_eq!(
            format!("{prefix}{key}"),
            "photos/5f2e9c1a-0000-4000-8000-aaaaaaaaaaaa"
        );
    }

    #[test]
    fn key_mapping_without_prefix() {
        let prefix = "";
        let key = "photo-id";
        assert_eq!(format!("{prefix}{key}"), "photo-id");
    }
}
