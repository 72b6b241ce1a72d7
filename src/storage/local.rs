//! Local filesystem object store.
//!
//! Photos are stored as flat files under a configurable root directory,
//! one file per photo id.  Writes follow the temp-fsync-rename pattern so
//! a crash never leaves a partially written object at its final path.
//!
//! Download links are self-served HMAC-signed URLs (see [`crate::sign`]);
//! the bytes are served back through `GET /photos/{photoId}/content`.

use bytes::Bytes;
use std::future::Future;
use std::io::Write;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use super::object::ObjectStore;
use crate::clock::Clock;

pub struct LocalObjectStore {
    /// Root directory for all stored photos.
    root: PathBuf,
    /// Base URL for self-served links.
    public_url: String,
    /// HMAC secret for link signatures.
    signing_secret: String,
    /// Clock used to anchor link expiry.
    clock: Arc<dyn Clock>,
}

impl LocalObjectStore {
    /// Create a new `LocalObjectStore` rooted at `root`.
    ///
    /// The directory is created if it does not exist.
    pub fn new(
        root: impl Into<PathBuf>,
        public_url: &str,
        signing_secret: &str,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        std::fs::create_dir_all(root.join(".tmp"))?;
        Ok(Self {
            root,
            public_url: public_url.to_string(),
            signing_secret: signing_secret.to_string(),
            clock,
        })
    }

    /// Resolve a photo key to a file path, rejecting path traversal.
    ///
    /// Keys are server-generated UUIDs in normal operation, but the check
    /// guards the content-serving path against crafted identifiers.
    fn resolve(&self, key: &str) -> anyhow::Result<PathBuf> {
        for component in std::path::Path::new(key).components() {
            match component {
                std::path::Component::Normal(_) => {}
                _ => anyhow::bail!("Invalid storage key: {key}"),
            }
        }
        Ok(self.root.join(key))
    }

    /// Generate a temp file path under .tmp/ for atomic writes.
    fn temp_path(&self) -> PathBuf {
        let id = uuid::Uuid::new_v4();
        self.root.join(".tmp").join(format!("tmp-{id}"))
    }
}

impl ObjectStore for LocalObjectStore {
    fn put(
        &self,
        key: &str,
        data: Bytes,
        _content_type: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>> {
        let key = key.to_string();
        Box::pin(async move {
            let final_path = self.resolve(&key)?;

            // Temp-fsync-rename: never expose a partial write.
            let tmp_path = self.temp_path();
            let mut file = std::fs::File::create(&tmp_path)?;
            file.write_all(&data)?;
            file.sync_all()?;
            std::fs::rename(&tmp_path, &final_path)?;

            Ok(())
        })
    }

    fn get(
        &self,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Bytes>> + Send + '_>> {
        let key = key.to_string();
        Box::pin(async move {
            let path = self.resolve(&key)?;
            if !path.exists() {
                anyhow::bail!("Object not found at key: {key}");
            }
            Ok(Bytes::from(std::fs::read(&path)?))
        })
    }

    fn exists(
        &self,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<bool>> + Send + '_>> {
        let key = key.to_string();
        Box::pin(async move {
            let path = self.resolve(&key)?;
            Ok(path.exists())
        })
    }

    fn presign_get(
        &self,
        key: &str,
        ttl: Duration,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + '_>> {
        let key = key.to_string();
        Box::pin(async move {
            let expires = self.clock.unix_now() + ttl.as_secs();
            Ok(crate::sign::signed_url(
                &self.public_url,
                &self.signing_secret,
                &key,
                expires,
            ))
        })
    }
}

// -- Tests --------------------------------------------------------------------
