use std::sync::Arc;

use food_discovery::api;
use food_discovery::config::Config;
use food_discovery::engine::discovery::DiscoveryService;
use food_discovery::error::AppError;
use food_discovery::source::http::HttpListingSource;
use food_discovery::source::memory::MemoryCatalog;
use food_discovery::state::AppState;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    let app_state = match &config.listing_source_url {
        Some(url) => {
            let source = HttpListingSource::new(
                url.clone(),
                config.listing_source_token.clone(),
                config.listing_source_timeout,
            )
            .map_err(|err| AppError::Internal(err.to_string()))?;

            tracing::info!(listing_source = %url, "using remote listing source");
            let discovery =
                DiscoveryService::new(Arc::new(source)).with_cache_ttl(config.candidate_cache_ttl);
            AppState::new(discovery, None, config.defaults)
        }
        None => {
            let catalog = Arc::new(MemoryCatalog::new());
            tracing::info!("using local listing catalog");
            let discovery =
                DiscoveryService::new(catalog.clone()).with_cache_ttl(config.candidate_cache_ttl);
            AppState::new(discovery, Some(catalog), config.defaults)
        }
    };

    let app = api::rest::router(Arc::new(app_state));

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(http_port = config.http_port, "http server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Internal(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
