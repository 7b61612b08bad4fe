//! HTTP routes and cross-cutting middleware.

use std::time::Duration;

use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::state::AppState;

pub mod campaigns;
pub mod health;

/// Build the application router: health endpoint, campaign routes under
/// `/api`, request tracing and CORS restricted to the configured frontend.
pub fn router(state: AppState) -> eyre::Result<Router> {
    let cors = cors_layer(&state.config.frontend_url)?;

    Ok(Router::new()
        .route("/health", get(health::health_handler))
        .nest("/api", campaigns::router(state))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors))
}

/// CORS for the browser frontend: it sends the multipart form plus the
/// user's bearer token, and reads the event-stream response.
fn cors_layer(frontend_url: &str) -> eyre::Result<CorsLayer> {
    let origin: HeaderValue = frontend_url
        .parse()
        .map_err(|e| eyre::eyre!("Invalid FRONTEND_URL '{}': {}", frontend_url, e))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
            axum::http::header::ACCEPT,
        ])
        .max_age(Duration::from_secs(3600)))
}
