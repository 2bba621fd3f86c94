//! Registry listing handler
//!
//! Handles GET /api/registry, read live on every call.

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;
use verimark_core::RegistrySource;

use crate::error::ApiError;
use crate::state::AppState;

/// One registered artwork
#[derive(Serialize, ToSchema)]
pub struct RegistryHash {
    #[schema(example = "c3f1a2b4d5e6f708")]
    pub phash: String,
    pub owner: String,
    /// First eight hex digits for display
    #[schema(example = "c3f1a2b4...")]
    pub short: String,
}

/// Registry contents
#[derive(Serialize, ToSchema)]
pub struct RegistryResponse {
    #[schema(example = 1)]
    pub count: usize,
    #[schema(example = "Algorand testnet (app 755787017)")]
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = 755787017)]
    pub app_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "testnet")]
    pub network: Option<String>,
    /// Entries in registry order
    pub hashes: Vec<RegistryHash>,
}

/// List every registered hash and its owner
#[utoipa::path(
    get,
    path = "/api/registry",
    tag = "Registry",
    responses(
        (status = 200, description = "Current registry contents", body = RegistryResponse),
        (status = 503, description = "Registry unavailable")
    )
)]
pub async fn registry_handler(
    State(state): State<AppState>,
) -> Result<Json<RegistryResponse>, ApiError> {
    let entries = state.verifier.list_registry(state.registry.as_ref()).await?;
    let source = state.registry.source();

    let (app_id, network) = match &source {
        RegistrySource::Algorand { network, app_id } => (Some(*app_id), Some(network.clone())),
        RegistrySource::InMemory => (None, None),
    };

    let hashes: Vec<RegistryHash> = entries
        .into_iter()
        .map(|entry| {
            let phash = entry.hash.to_hex();
            RegistryHash {
                short: format!("{}...", &phash[..8]),
                phash,
                owner: entry.owner.to_string(),
            }
        })
        .collect();

    tracing::debug!(count = hashes.len(), source = %source, "Listed registry");

    Ok(Json(RegistryResponse {
        count: hashes.len(),
        source: source.to_string(),
        app_id,
        network,
        hashes,
    }))
}
