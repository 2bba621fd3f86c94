//! Verimark Server - REST API for perceptual registry matching
//!
//! Exposes verimark-core functionality via HTTP endpoints:
//! - POST /api/compute-hash - Perceptual hash of an upload
//! - POST /api/verify - Match an upload against the registry
//! - GET /api/registry - Registered hashes and owners
//! - POST /api/analyze - Intermediate steps of the hash

use std::net::SocketAddr;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;
use verimark_server::{create_router_with_config, AppState, Config};

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutting down");
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let state = match AppState::from_config(&config) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize services");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        registry = %state.registry.source(),
        policy_version = state.verifier.policy().version,
        threshold = state.verifier.policy().plagiarism_threshold,
        variants = state.verifier.catalogue().len(),
        asset_store = state.asset_store.is_some(),
        "Verimark server starting"
    );

    let app = create_router_with_config(state, &config);
    let addr = config.socket_addr();

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, %addr, "Failed to bind");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!("Listening on http://{}", addr);
    tracing::info!("API docs at http://{}/docs", addr);

    if let Err(e) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    {
        tracing::error!(error = %e, "Server error");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
