//! Forensic analysis handler
//!
//! Handles POST /api/analyze: every intermediate step of the hash, for display.

use axum::{
    extract::{Multipart, State},
    Json,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::Serialize;
use utoipa::ToSchema;
use verimark_core::analyze;

use crate::error::ApiError;
use crate::handlers::run_blocking;
use crate::multipart::FileField;
use crate::state::AppState;

/// Pipeline artifacts for one image
#[derive(Serialize, ToSchema)]
pub struct AnalyzeResponse {
    #[schema(example = "c3f1a2b4d5e6f708")]
    pub phash_hex: String,
    /// 64 characters of `0`/`1`, DC coefficient first
    pub phash_binary: String,
    /// AC median used as the bit threshold, rounded to 4 decimals
    pub median_frequency: f64,
    /// Same bits as `phash_binary`, row-major 8×8
    pub bitmask_8x8: Vec<u8>,
    /// Low-frequency coefficients normalized into 0..=255
    pub dct_heatmap: Vec<f64>,
    /// Denoised 32×32 grayscale sample, base64 PNG
    pub gray_32x32_b64: String,
    /// 32×32 grayscale sample without denoising, base64 PNG
    pub gray_original_b64: String,
    /// Raw pixels of the denoised sample
    pub pixels_32x32: Vec<u8>,
}

/// Show every intermediate step of the hash computation
///
/// Median filter → 32×32 grayscale → DCT → 8×8 low-pass → median bitmask.
/// Purely diagnostic; verdicts never depend on this output.
#[utoipa::path(
    post,
    path = "/api/analyze",
    tag = "Hashing",
    request_body(content_type = "multipart/form-data", description = "Image to analyze"),
    responses(
        (status = 200, description = "Pipeline artifacts", body = AnalyzeResponse),
        (status = 400, description = "Missing file or undecodable image")
    )
)]
pub async fn analyze_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let file = FileField::extract(&mut multipart, state.max_file_size).await?;
    let response = run_blocking(move || {
        let analysis = analyze(&file.data)?;
        tracing::info!(hash = %analysis.hash, median = analysis.median, "Analyzed image");

        Ok(AnalyzeResponse {
            phash_hex: analysis.hash.to_hex(),
            phash_binary: analysis.binary(),
            median_frequency: (analysis.median * 10_000.0).round() / 10_000.0,
            bitmask_8x8: analysis.bits().to_vec(),
            dct_heatmap: analysis.heatmap().to_vec(),
            gray_32x32_b64: BASE64.encode(analysis.gray_denoised.to_png()?),
            gray_original_b64: BASE64.encode(analysis.gray_original.to_png()?),
            pixels_32x32: analysis.gray_denoised.pixels().to_vec(),
        })
    })
    .await?;

    Ok(Json(response))
}
