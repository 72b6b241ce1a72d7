//! Abstract object store trait.
//!
//! Every storage backend must implement [`ObjectStore`].  The trait works
//! in terms of opaque byte payloads keyed by photo id; the content type is
//! a label carried alongside the bytes, never interpreted.

use bytes::Bytes;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Async object storage contract.
pub trait ObjectStore: Send + Sync + 'static {
    /// Write `data` under `key`, tagged with `content_type`.
    fn put(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>>;

    /// Read the full payload stored under `key`.
    fn get(
        &self,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Bytes>> + Send + '_>>;

    /// Check whether an object exists under `key`.
    fn exists(
        &self,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<bool>> + Send + '_>>;

    /// Mint a time-limited authorized read link for `key`, valid for `ttl`
    /// from the moment of the call.  Pure signing: the object's existence
    /// is not checked.
    fn presign_get(
        &self,
        key: &str,
        ttl: Duration,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + '_>>;
}
