use anyhow::Context;
use blobcache::config::{self, Config};
use blobcache::{CounterMetrics, DigestCache, Provider};
use std::env;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod webserver;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    info!("Starting blobcache {}", env!("CARGO_PKG_VERSION"));

    let config_path = env::var("BLOBCACHE_CONFIG").unwrap_or_else(|_| "config.yaml".to_string());
    let config = if Path::new(&config_path).exists() {
        config::load_config(&config_path)?
    } else {
        info!("No config file at {}, using defaults", config_path);
        Config::default()
    };

    let metrics = Arc::new(CounterMetrics::new());
    let cache = DigestCache::new(&config.cache)
        .context("Failed to create digest cache")?
        .with_metrics(metrics.clone());
    let provider = Provider::new(Arc::new(cache));

    let app = webserver::create_app(webserver::AppState { provider, metrics });
    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], config.webserver.port));
    info!("Starting webserver on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {:?}", e);
    }
}
