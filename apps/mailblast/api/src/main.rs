use std::sync::Arc;

use domain_dispatch::{GraphConfig, GraphMailer};
use tokio::signal;
use tracing::info;

mod api;
mod config;
mod observability;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output (before any fallible operations)
    observability::install_color_eyre();

    // Load configuration from environment variables
    let config = Config::from_env()?;
    observability::init_tracing(&config.environment);

    // One shared HTTP client; the Graph mailer clones are cheap handles on
    // its connection pool.
    let client = reqwest::Client::new();
    let mailer = Arc::new(GraphMailer::new(
        client,
        GraphConfig::new(config.graph_api_url.clone()),
    ));

    let state = AppState::new(config.clone(), mailer);
    let app = api::router(state)?;

    let listener = tokio::net::TcpListener::bind(config.server.address()).await?;
    info!("Server starting on {}", listener.local_addr()?);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .inspect_err(|e| tracing::error!("Server encountered an error: {:?}", e))?;

    info!("Mailblast API shutdown complete");
    Ok(())
}

/// Completes on SIGINT or SIGTERM, letting in-flight campaign streams finish
/// draining before the listener closes.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully");
        },
        _ = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully");
        },
    }
}
