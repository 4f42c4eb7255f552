use clap::Parser;
use produce_store::config::Config;
use produce_store::inventory::AppState;
use produce_store::router::create_app_router;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "produce_store=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::parse();
    tracing::info!("Bootstrap dataset: {}", config.dataset.display());

    // Initialize application state
    let state = Arc::new(AppState::new(&config.dataset, config.retry_bootstrap));

    // Build application router with all routes and middleware
    let app = create_app_router(state);

    // Start the server
    let addr = config.addr();
    tracing::info!("Server running on http://{}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
