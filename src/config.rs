//! Configuration loading and types for PhotoVault.
//!
//! Configuration is read from a YAML file and deserialized into the
//! [`Config`] struct.  Each subsection governs a different part of the
//! system: networking, metadata persistence, object storage, retrieval
//! link policy, logging, and observability.
//!
//! A handful of environment variables override their config counterparts
//! so the service can be pointed at different cloud resources without
//! editing the file: `PHOTOS_TABLE`, `PHOTOS_BUCKET`, `URL_EXPIRATION`.

use serde::Deserialize;
use std::path::Path;

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Metadata store settings.
    #[serde(default)]
    pub metadata: MetadataConfig,

    /// Object storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Download-link policy.
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Observability settings (metrics + health probes).
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            metadata: MetadataConfig::default(),
            storage: StorageConfig::default(),
            retrieval: RetrievalConfig::default(),
            logging: LoggingConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind host address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum upload size in bytes (default 25 MiB).
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_size: default_max_upload_size(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: text or json.
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Observability settings.
///
/// Controls Prometheus metrics collection.  Enabled by default.
#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    /// Enable Prometheus metrics collection and `/metrics` endpoint.
    #[serde(default = "default_true")]
    pub metrics: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self { metrics: true }
    }
}

/// Metadata store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetadataConfig {
    /// Backend type: `memory` or `dynamodb`.
    #[serde(default = "default_metadata_backend")]
    pub backend: String,

    /// DynamoDB-specific configuration.
    #[serde(default)]
    pub dynamodb: Option<DynamoDbConfig>,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            backend: default_metadata_backend(),
            dynamodb: None,
        }
    }
}

/// DynamoDB metadata store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DynamoDbConfig {
    /// Table name holding photo records.
    #[serde(default = "default_photos_table")]
    pub table: String,
    /// AWS region (falls back to the SDK default chain when empty).
    #[serde(default)]
    pub region: String,
    /// Custom DynamoDB endpoint (e.g. LocalStack).
    #[serde(default)]
    pub endpoint_url: String,
}

impl Default for DynamoDbConfig {
    fn default() -> Self {
        Self {
            table: default_photos_table(),
            region: String::new(),
            endpoint_url: String::new(),
        }
    }
}

/// Object storage backend configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Backend type: `memory`, `local`, or `s3`.
    #[serde(default = "default_storage_backend")]
    pub backend: String,

    /// Local filesystem storage configuration.
    #[serde(default)]
    pub local: LocalStorageConfig,

    /// AWS S3 storage configuration.
    #[serde(default)]
    pub s3: Option<S3StorageConfig>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            local: LocalStorageConfig::default(),
            s3: None,
        }
    }
}

/// Local filesystem storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LocalStorageConfig {
    /// Root directory for stored photos.
    #[serde(default = "default_storage_root")]
    pub root_dir: String,
}

impl Default for LocalStorageConfig {
    fn default() -> Self {
        Self {
            root_dir: default_storage_root(),
        }
    }
}

/// AWS S3 storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct S3StorageConfig {
    /// Backing S3 bucket name.
    pub bucket: String,
    /// AWS region.
    #[serde(default = "default_region")]
    pub region: String,
    /// Key prefix in the backing bucket.
    #[serde(default)]
    pub prefix: String,
    /// Custom S3-compatible endpoint (e.g. MinIO, LocalStack).
    #[serde(default)]
    pub endpoint_url: String,
    /// Force path-style URL addressing.
    #[serde(default)]
    pub use_path_style: bool,
}

/// Download-link policy.
#[derive(Debug, Clone, Deserialize)]
pub struct RetrievalConfig {
    /// Lifetime of generated download links, in seconds.
    #[serde(default = "default_url_ttl")]
    pub url_ttl_seconds: u64,

    /// Whether to confirm the binary exists in the object store before
    /// signing a download link.  Off by default: the metadata record is
    /// trusted, and a link to an out-of-band-deleted object only fails
    /// when the client dereferences it.
    #[serde(default)]
    pub verify_object_exists: bool,

    /// Public base URL used in self-served links (local/memory backends).
    #[serde(default = "default_public_url")]
    pub public_url: String,

    /// HMAC secret for self-served link signatures.
    #[serde(default = "default_signing_secret")]
    pub signing_secret: String,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            url_ttl_seconds: default_url_ttl(),
            verify_object_exists: false,
            public_url: default_public_url(),
            signing_secret: default_signing_secret(),
        }
    }
}

// -- Defaults ----------------------------------------------------------------

fn default_true() -> bool {
    true
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8086
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_metadata_backend() -> String {
    "memory".to_string()
}

fn default_photos_table() -> String {
    "Photos".to_string()
}

fn default_storage_backend() -> String {
    "local".to_string()
}

fn default_storage_root() -> String {
    "./data/photos".to_string()
}

fn default_max_upload_size() -> u64 {
    26_214_400 // 25 MiB
}

fn default_url_ttl() -> u64 {
    3600
}

fn default_public_url() -> String {
    "http://localhost:8086".to_string()
}

fn default_signing_secret() -> String {
    "photovault-dev-secret".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

// -- Loader ------------------------------------------------------------------

/// Load and parse configuration from a YAML file at `path`, then apply
/// environment overrides.
pub fn load_config<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref())?;
    let mut config: Config = serde_yaml::from_str(&contents)?;
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Apply environment variable overrides to a loaded configuration.
///
/// - `PHOTOS_TABLE`: DynamoDB table name.
/// - `PHOTOS_BUCKET`: S3 bucket name.
/// - `URL_EXPIRATION`: link TTL in seconds (ignored if not an integer).
pub fn apply_env_overrides(config: &mut Config) {
    if let Ok(table) = std::env::var("PHOTOS_TABLE") {
        config
            .metadata
            .dynamodb
            .get_or_insert_with(DynamoDbConfig::default)
            .table = table;
    }
    if let Ok(bucket) = std::env::var("PHOTOS_BUCKET") {
        if let Some(s3) = config.storage.s3.as_mut() {
            s3.bucket = bucket;
        } else {
            config.storage.s3 = Some(S3StorageConfig {
                bucket,
                region: default_region(),
                prefix: String::new(),
                endpoint_url: String::new(),
                use_path_style: false,
            });
        }
    }
    if let Ok(ttl) = std::env::var("URL_EXPIRATION") {
        if let Ok(secs) = ttl.parse::<u64>() {
            config.retrieval.url_ttl_seconds = secs;
        }
    }
}

// -- Tests --------------------------------------------------------------------
