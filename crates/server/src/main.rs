mod api;
mod metrics;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use debridarr_core::{
    create_provider, load_config, validate_config, Aggregator, CinemetaClient, DebridProvider,
    HttpTorrentFetcher, IndexerHealth, IndexerRegistry, JackettRegistry, MemoryCache,
    MetadataService, TorrentFetcher,
};

use api::create_router;
use state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("DEBRIDARR_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;
    info!("Configuration loaded successfully");

    // Create the search transport
    let search_config = config
        .search
        .clone()
        .context("No [search] section configured; a Jackett endpoint is required")?;
    info!("Initializing Jackett registry at {}", search_config.url);
    let registry: Arc<dyn IndexerRegistry> = Arc::new(JackettRegistry::new(search_config));

    // Metadata service
    info!("Initializing Cinemeta client at {}", config.metadata.url);
    let metadata: Arc<dyn MetadataService> =
        Arc::new(CinemetaClient::new(config.metadata.clone()));

    // Descriptor fetcher
    let fetcher: Arc<dyn TorrentFetcher> =
        Arc::new(HttpTorrentFetcher::new(Duration::from_secs(30)));

    // Debrid provider (optional; streams carry no cache status without one)
    let provider: Option<Arc<dyn DebridProvider>> = create_provider(&config.debrid);
    match &provider {
        Some(p) => info!("Using debrid provider: {}", p.short_name()),
        None => info!("No debrid provider configured; cache reconciliation disabled"),
    }

    // Process-scoped pipeline state
    let health = Arc::new(IndexerHealth::new(config.health.clone()));
    let cache = Arc::new(MemoryCache::new());

    let aggregator = Arc::new(Aggregator::new(
        registry,
        metadata,
        fetcher,
        provider,
        cache,
        health,
        config.proxy.clone(),
        config.debrid.clone(),
    ));

    // Create app state and router
    let state = Arc::new(AppState::new(config.clone(), aggregator));
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
