//! # Quill API Server
//!
//! The main entry point for the Actix-web HTTP server.

use actix_web::HttpServer;

mod app;
mod config;
mod handlers;
mod middleware;
mod state;
mod telemetry;

#[cfg(test)]
mod tests;

use config::AppConfig;
use state::AppState;
use telemetry::{TelemetryConfig, init_telemetry};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Invalid configuration aborts startup before anything binds
    let config = AppConfig::from_env().map_err(std::io::Error::other)?;

    init_telemetry(&TelemetryConfig::from(&config));

    tracing::info!(
        environment = %config.environment,
        "Starting Quill API Server on {}:{}",
        config.host,
        config.port
    );

    let bind = (config.host.clone(), config.port);
    let state = build_state(config).await?;

    HttpServer::new(move || app::build_app(state.clone()))
        .bind(bind)?
        .run()
        .await
}

#[cfg(feature = "postgres")]
async fn build_state(config: AppConfig) -> std::io::Result<AppState> {
    AppState::connect(config).await.inspect_err(|e| {
        tracing::error!(error = %e, "Failed to connect to database");
    })
}

#[cfg(not(feature = "postgres"))]
async fn build_state(config: AppConfig) -> std::io::Result<AppState> {
    tracing::warn!("Running without postgres feature - data is kept in memory");
    Ok(AppState::in_memory(config))
}
