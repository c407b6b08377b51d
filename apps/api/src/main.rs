mod config;
mod errors;
mod ingest;
mod resume;
mod routes;
mod state;
mod store;
mod upstream;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, S3Config};
use crate::routes::build_router;
use crate::state::{AppState, SessionRegistry};
use crate::store::{MemorySnapshotStore, RedisSnapshotStore, SnapshotStore};
use crate::upstream::{CraftClient, DocumentArchive, DocumentClient};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Résumé Studio API v{}", env!("CARGO_PKG_VERSION"));

    // Snapshot store: Redis when configured, otherwise process memory
    let store: Arc<dyn SnapshotStore> = match &config.redis_url {
        Some(url) => {
            let client = redis::Client::open(url.clone())?;
            info!("Redis snapshot store initialized (prefix: {})", config.snapshot_key_prefix);
            Arc::new(RedisSnapshotStore::new(
                client,
                config.snapshot_key_prefix.clone(),
            ))
        }
        None => {
            warn!("REDIS_URL not set; snapshots are kept in memory only");
            Arc::new(MemorySnapshotStore::new())
        }
    };

    // Upstream services
    let craft = CraftClient::new(&config.craft_service_url)?;
    let documents = DocumentClient::new(&config.document_service_url)?;
    info!(
        "Upstream clients initialized (craft: {}, documents: {})",
        config.craft_service_url, config.document_service_url
    );

    let archive = match &config.s3 {
        Some(s3) => {
            let client = build_s3_client(s3).await;
            info!("S3 document archive initialized (bucket: {})", s3.bucket);
            Some(DocumentArchive::new(client, s3.bucket.clone()))
        }
        None => None,
    };

    let state = AppState {
        sessions: SessionRegistry::new(store, config.drag_throttle, config.session_idle),
        craft,
        documents,
        archive,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(s3: &S3Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &s3.access_key_id,
        &s3.secret_access_key,
        None,
        None,
        "studio-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&s3.endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
