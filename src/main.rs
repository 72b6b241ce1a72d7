//! PhotoVault -- photo storage service.
//!
//! Stateless request handling: all durable state lives in the configured
//! object store and metadata store. SIGTERM/SIGINT handlers only stop
//! accepting connections and wait for in-flight requests before exiting.

use std::sync::Arc;

use clap::Parser;
use tracing::info;

use photovault::clock::SystemClock;
use photovault::id::UuidGenerator;

/// Command-line arguments for the PhotoVault server.
#[derive(Parser, Debug)]
#[command(
    name = "photovault",
    version,
    about = "Photo storage service with presigned download links"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, default_value = "photovault.example.yaml")]
    config: String,

    /// Override the bind address (host:port).
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = photovault::config::load_config(&cli.config)?;

    // Initialize tracing / logging.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.logging.level.clone()));
    if config.logging.format == "json" {
        tracing_subscriber::fmt().with_env_filter(env_filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    info!("Loaded configuration from {}", cli.config);

    let bind_addr = cli
        .bind
        .unwrap_or_else(|| format!("{}:{}", config.server.host, config.server.port));

    // Initialize Prometheus metrics recorder and register metric descriptions.
    if config.observability.metrics {
        photovault::metrics::init_metrics();
        photovault::metrics::describe_metrics();
        info!("Prometheus metrics initialized");
    }

    let clock: Arc<dyn photovault::clock::Clock> = Arc::new(SystemClock);

    // Initialize metadata store based on config.
    let metadata: Arc<dyn photovault::metadata::store::MetadataStore> =
        match config.metadata.backend.as_str() {
            "dynamodb" => {
                let ddb_config = config.metadata.dynamodb.as_ref().ok_or_else(|| {
                    anyhow::anyhow!(
                        "metadata.backend is 'dynamodb' but metadata.dynamodb config section is missing"
                    )
                })?;
                let store = photovault::metadata::dynamodb::DynamoDbMetadataStore::new(ddb_config)
                    .await?;
                info!(
                    "DynamoDB metadata store initialized: table={}",
                    ddb_config.table
                );
                Arc::new(store)
            }
            "memory" | _ => {
                info!("In-memory metadata store initialized (no persistence)");
                Arc::new(photovault::metadata::memory::MemoryMetadataStore::new())
            }
        };

    // Initialize object storage backend based on config.
    let storage: Arc<dyn photovault::storage::object::ObjectStore> =
        match config.storage.backend.as_str() {
            "s3" => {
                let s3_config = config.storage.s3.as_ref().ok_or_else(|| {
                    anyhow::anyhow!(
                        "storage.backend is 's3' but storage.s3 config section is missing"
                    )
                })?;
                let store = photovault::storage::s3::S3ObjectStore::new(s3_config).await?;
                info!(
                    "S3 object store initialized: bucket={} region={} prefix='{}'",
                    s3_config.bucket, s3_config.region, s3_config.prefix
                );
                Arc::new(store)
            }
            "memory" => {
                let store = photovault::storage::memory::MemoryObjectStore::new(
                    &config.retrieval.public_url,
                    &config.retrieval.signing_secret,
                    clock.clone(),
                );
                info!("In-memory object store initialized (no persistence)");
                Arc::new(store)
            }
            "local" | _ => {
                let root = &config.storage.local.root_dir;
                let store = photovault::storage::local::LocalObjectStore::new(
                    root,
                    &config.retrieval.public_url,
                    &config.retrieval.signing_secret,
                    clock.clone(),
                )?;
                info!("Local object store initialized at {}", root);
                Arc::new(store)
            }
        };

    // Build AppState.
    let state = Arc::new(photovault::AppState {
        config: config.clone(),
        metadata,
        storage,
        ids: Arc::new(UuidGenerator),
        clock,
    });

    let app = photovault::server::app(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("PhotoVault listening on {}", bind_addr);

    // Graceful shutdown: on SIGTERM/SIGINT, stop accepting new connections,
    // wait for in-flight requests to complete, then exit.
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("PhotoVault shut down");

    Ok(())
}

/// Wait for SIGTERM or SIGINT (Ctrl+C), then return to trigger graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, shutting down");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        },
    }
}
