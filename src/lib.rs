//! PhotoVault library: photo storage service.
//!
//! This crate provides the components for running a small photo storage
//! HTTP service: request handling, pluggable object storage and metadata
//! backends, download-link signing, and observability.

use std::sync::Arc;

pub mod clock;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod id;
pub mod metadata;
pub mod metrics;
pub mod server;
pub mod sign;
pub mod storage;

use crate::clock::Clock;
use crate::config::Config;
use crate::id::IdGenerator;
use crate::metadata::store::MetadataStore;
use crate::storage::object::ObjectStore;

/// Shared application state passed to all handlers via `axum::extract::State`.
pub struct AppState {
    /// Server configuration.
    pub config: Config,
    /// Metadata store (DynamoDB or in-memory).
    pub metadata: Arc<dyn MetadataStore>,
    /// Object storage backend (S3, local filesystem, or in-memory).
    pub storage: Arc<dyn ObjectStore>,
    /// Photo identifier generator.
    pub ids: Arc<dyn IdGenerator>,
    /// Wall-clock source for timestamps and link expiry.
    pub clock: Arc<dyn Clock>,
}
