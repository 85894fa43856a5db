//! Mythos API server entry point.

use std::error::Error;
use std::sync::Arc;

use axum::Router;
use mythos_api::config::ServerConfig;
use mythos_api::routes;
use mythos_api::state::AppState;
use mythos_core::clock::SystemClock;
use mythos_session::application::controller::ControllerConfig;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting Mythos API server");

    // Read configuration from environment.
    let config = ServerConfig::from_env()?;
    let narrator = config.build_narrator()?;
    tracing::info!(
        narrator = ?config.narrator,
        seeded = config.rng_seed.is_some(),
        "narrator configured"
    );

    // Build application state.
    let controller_config = ControllerConfig {
        narrator_timeout: config.narrator_timeout,
        ..ControllerConfig::default()
    };
    let app_state = AppState::new(
        narrator,
        Arc::new(SystemClock),
        AppState::seeded_rng_factory(config.rng_seed),
        controller_config,
    );

    // Build router.
    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    let app = Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/sessions", routes::session::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server.
    let addr = config.bind_addr()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
