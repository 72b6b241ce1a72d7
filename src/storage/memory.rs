//! In-memory object store.
//!
//! Photo bytes are held in a `RwLock<HashMap>`.  Download links are
//! self-served HMAC-signed URLs (see [`crate::sign`]) since there is no
//! external service to delegate signing to.  Used by tests and ephemeral
//! deployments.

use bytes::Bytes;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use super::object::ObjectStore;
use crate::clock::Clock;

pub struct MemoryObjectStore {
    /// key -> (data, content_type).
    objects: RwLock<HashMap<String, (Bytes, String)>>,
    /// Base URL for self-served links.
    public_url: String,
    /// HMAC secret for link signatures.
    signing_secret: String,
    /// Clock used to anchor link expiry.
    clock: Arc<dyn Clock>,
}

impl MemoryObjectStore {
    pub fn new(public_url: &str, signing_secret: &str, clock: Arc<dyn Clock>) -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            public_url: public_url.to_string(),
            signing_secret: signing_secret.to_string(),
            clock,
        }
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.read().expect("rwlock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The content type an object was stored with, if present.
    pub fn content_type_of(&self, key: &str) -> Option<String> {
        self.objects
            .read()
            .expect("rwlock poisoned")
            .get(key)
            .map(|(_, ct)| ct.clone())
    }
}

impl ObjectStore for MemoryObjectStore {
    fn put(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>> {
        let key = key.to_string();
        let content_type = content_type.to_string();
        Box::pin(async move {
            let mut objects = self.objects.write().expect("rwlock poisoned");
            objects.insert(key, (data, content_type));
            Ok(())
        })
    }

    fn get(
        &self,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Bytes>> + Send + '_>> {
        let key = key.to_string();
        Box::pin(async move {
            let objects = self.objects.read().expect("rwlock poisoned");
            objects
                .get(&key)
                .map(|(data, _)| data.clone())
                .ok_or_else(|| anyhow::anyhow!("Object not found at key: {key}"))
        })
    }

    fn exists(
        &self,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<bool>> + Send + '_>> {
        let key = key.to_string();
        Box::pin(async move {
            let objects = self.objects.read().expect("rwlock poisoned");
            Ok(objects.contains_key(&key))
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
