//! Health check handlers
//!
//! Provides health and readiness endpoints for monitoring and orchestration.

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// Health check response
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    #[schema(example = "healthy")]
    pub status: &'static str,
    /// Server version from Cargo.toml
    #[schema(example = "0.1.0")]
    pub version: &'static str,
    /// Service name
    pub service: &'static str,
    /// Registry the server verifies against
    #[schema(example = "Algorand testnet (app 755787017)")]
    pub registry: String,
    /// Active matching policy revision
    #[schema(example = 1)]
    pub policy_version: u32,
    /// Number of geometric variants tried per verification
    #[schema(example = 8)]
    pub variants: usize,
    /// Whether originals are kept for byte comparison
    pub asset_store_configured: bool,
}

/// GET /health - Health check endpoint
///
/// Reports configuration only; the registry is not contacted here.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses((status = 200, description = "Service is running", body = HealthResponse))
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        service: "verimark-server",
        registry: state.registry.source().to_string(),
        policy_version: state.verifier.policy().version,
        variants: state.verifier.catalogue().len(),
        asset_store_configured: state.asset_store.is_some(),
    })
}

/// Readiness response for Kubernetes
#[derive(Serialize, ToSchema)]
pub struct ReadyResponse {
    /// Whether the service is ready to accept traffic
    pub ready: bool,
    /// Optional message explaining status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

/// GET /ready - Kubernetes readiness check
#[utoipa::path(
    get,
    path = "/ready",
    tag = "Health",
    responses((status = 200, description = "Service is ready", body = ReadyResponse))
)]
pub async fn ready() -> Json<ReadyResponse> {
    Json(ReadyResponse {
        ready: true,
        message: None,
    })
}
