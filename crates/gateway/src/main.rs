//! PDFHub API Gateway
//!
//! The main entry point for all external API requests.
//! Handles:
//! - Public catalog browsing, search, ratings and reviews
//! - Administrator authentication and catalog management
//! - Rate limiting of anonymous writes
//! - Observability (logging, metrics)

mod app;
mod extract;
mod handlers;
mod middleware;

use app::{create_router, AppState};
use metrics_exporter_prometheus::PrometheusBuilder;
use pdfhub_common::{
    auth::{generate_secret, JwtManager},
    catalog::{AdminStore, CatalogStore, MemoryStore},
    config::{AppConfig, ObservabilityConfig},
    db::{DbPool, PgStore},
    metrics::{self, LATENCY_BUCKETS},
    storage::LocalThumbnailStore,
};
use pdfhub_search::CatalogFilter;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration, from an explicit file when APP_CONFIG names one
    let config = match std::env::var("APP_CONFIG") {
        Ok(path) => AppConfig::from_file(&path),
        Err(_) => AppConfig::load(),
    }
    .map_err(|e| {
        eprintln!("Failed to load configuration: {e}");
        e
    })?;

    init_tracing(&config.observability);

    info!("Starting PDFHub API Gateway v{}", pdfhub_common::VERSION);

    // Initialize metrics
    if config.observability.metrics_port != 0 {
        let metrics_addr = SocketAddr::from(([0, 0, 0, 0], config.observability.metrics_port));
        PrometheusBuilder::new()
            .set_buckets(LATENCY_BUCKETS)?
            .with_http_listener(metrics_addr)
            .install()?;
        info!("Prometheus exporter listening on {}", metrics_addr);
    }
    metrics::register_metrics();

    let state = build_state(config).await?;
    let addr: SocketAddr = format!("{}:{}", state.config.server.host, state.config.server.port).parse()?;

    tokio::fs::create_dir_all(&state.config.storage.thumbnail_dir).await?;

    // Build the router
    let app = create_router(state);

    // Start the server
    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},tower_http=info", config.log_level)));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    if config.json_logging {
        builder.json().init();
    } else {
        builder.pretty().init();
    }
}

/// Wire stores, auth and matching from configuration
async fn build_state(config: AppConfig) -> anyhow::Result<AppState> {
    let (catalog, admins): (Arc<dyn CatalogStore>, Arc<dyn AdminStore>) = match &config.database.url {
        Some(_) => {
            let pool = DbPool::new(&config.database).await?;
            if config.database.run_migrations {
                pool.migrate(&config.database.migrations_dir).await?;
            }
            let store = Arc::new(PgStore::new(pool));
            (store.clone() as Arc<dyn CatalogStore>, store as Arc<dyn AdminStore>)
        }
        None => {
            warn!("No database URL configured, catalog is held in memory");
            let store = Arc::new(MemoryStore::new());
            (store.clone() as Arc<dyn CatalogStore>, store as Arc<dyn AdminStore>)
        }
    };

    let secret = match &config.auth.jwt_secret {
        Some(secret) if !secret.is_empty() => secret.clone(),
        _ => {
            warn!("No JWT secret configured, tokens will not survive a restart");
            generate_secret()
        }
    };

    Ok(AppState {
        jwt: Arc::new(JwtManager::new(&secret, config.auth.jwt_expiration_secs)),
        thumbnails: Arc::new(LocalThumbnailStore::new(&config.storage)),
        filter: Arc::new(CatalogFilter::new(&config.matching)),
        catalog,
        admins,
        config: Arc::new(config),
    })
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
