//! Hash computation handler
//!
//! Handles POST /api/compute-hash. The client writes the returned hash to the
//! registry itself; the server never signs registry transactions.

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use verimark_core::HashReceipt;

use crate::error::ApiError;
use crate::handlers::run_blocking;
use crate::multipart::FileField;
use crate::state::AppState;

/// Response for hash computation
#[derive(Serialize, ToSchema)]
pub struct ComputeHashResponse {
    /// 64-bit perceptual hash, 16 lowercase hex digits
    #[schema(example = "c3f1a2b4d5e6f708")]
    pub phash: String,
    #[schema(example = "ok")]
    pub status: &'static str,
    /// Location of the stored original, when the store reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_url: Option<String>,
    /// Whether the original was uploaded to the asset store
    pub asset_stored: bool,
}

impl From<HashReceipt> for ComputeHashResponse {
    fn from(receipt: HashReceipt) -> Self {
        Self {
            phash: receipt.hash.to_hex(),
            status: "ok",
            asset_url: receipt.asset_url,
            asset_stored: receipt.asset_stored,
        }
    }
}

/// Compute the perceptual hash of an uploaded image
///
/// Accepts multipart/form-data with:
/// - **file** (required): the artwork (PNG, JPEG, GIF or WebP)
///
/// When an asset store is configured the original bytes are uploaded too,
/// keyed by the hash, so later exact matches can be checked byte for byte.
/// A failed upload does not fail the request.
#[utoipa::path(
    post,
    path = "/api/compute-hash",
    tag = "Hashing",
    request_body(content_type = "multipart/form-data", description = "Image to hash"),
    responses(
        (status = 200, description = "Hash computed", body = ComputeHashResponse),
        (status = 400, description = "Missing file or undecodable image"),
        (status = 413, description = "File too large")
    )
)]
pub async fn compute_hash_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ComputeHashResponse>, ApiError> {
    let mut file = FileField::extract(&mut multipart, state.max_file_size).await?;

    let receipt = match &state.asset_store {
        Some(store) => {
            state
                .verifier
                .register_asset(&file.data, store.as_ref())
                .await?
        }
        None => {
            let verifier = Arc::clone(&state.verifier);
            let data = std::mem::take(&mut file.data);
            HashReceipt {
                hash: run_blocking(move || verifier.compute_hash(&data)).await?,
                asset_url: None,
                asset_stored: false,
            }
        }
    };

    tracing::info!(
        hash = %receipt.hash,
        file_name = file.file_name.as_deref().unwrap_or("-"),
        "Computed hash"
    );

    Ok(Json(receipt.into()))
}
