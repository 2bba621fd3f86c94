//! Verification handler
//!
//! Handles POST /api/verify requests: match an upload against the live
//! registry under every geometric variant.

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use verimark_core::{RegistrySource, Verdict, VerificationReport};

use crate::error::ApiError;
use crate::multipart::FileField;
use crate::state::AppState;

/// Response for verification
#[derive(Serialize, ToSchema)]
pub struct VerifyResponse {
    /// Human-readable verdict
    #[schema(example = "Plagiarism Detected")]
    pub status: &'static str,
    /// Machine-readable verdict: original, derivative, clear or empty_registry
    #[schema(example = "derivative")]
    pub verdict: String,
    /// Best Hamming distance found
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = 4)]
    pub score: Option<u32>,
    /// Registered hash of the match
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "c3f1a2b4d5e6f708")]
    pub matched_hash: Option<String>,
    /// Owner of the matched registration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// Name of the winning geometric variant
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "Rot180")]
    pub variant: Option<String>,
    /// How the verdict was reached
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "Detected via 180deg Rotation")]
    pub detection_method: Option<String>,
    /// Set when the registry is empty or unreachable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub variants_evaluated: usize,
    pub variants_skipped: usize,
    pub policy_version: u32,
    pub registry_size: usize,
    /// False when the registry could not be fetched
    pub registry_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
}

impl VerifyResponse {
    pub fn from_report(report: VerificationReport, source: &RegistrySource) -> Self {
        let message = match (report.verdict, report.registry_available) {
            (Verdict::EmptyRegistry, false) => {
                Some(format!("Registry {source} could not be fetched. Try again later."))
            }
            (Verdict::EmptyRegistry, true) => {
                Some(format!("No artworks found in {source}. Register one first."))
            }
            _ => None,
        };

        let (app_id, network) = match source {
            RegistrySource::Algorand { network, app_id } => (Some(*app_id), Some(network.clone())),
            RegistrySource::InMemory => (None, None),
        };

        Self {
            status: report.verdict.status_label(),
            verdict: verdict_code(report.verdict).to_string(),
            score: report.score,
            matched_hash: report.matched_hash.map(|h| h.to_hex()),
            owner: report.owner.map(|o| o.to_string()),
            variant: report.variant,
            detection_method: report.detection_method,
            message,
            variants_evaluated: report.variants_evaluated,
            variants_skipped: report.variants_skipped,
            policy_version: report.policy_version,
            registry_size: report.registry_size,
            registry_available: report.registry_available,
            app_id,
            network,
        }
    }
}

fn verdict_code(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Original => "original",
        Verdict::Derivative => "derivative",
        Verdict::Clear => "clear",
        Verdict::EmptyRegistry => "empty_registry",
    }
}

/// Verify an upload against the registry
///
/// Accepts multipart/form-data with:
/// - **file** (required): the suspect image
///
/// The registry is read fresh on every call. Each geometric variant of the
/// upload (rotations, mirrors and, when enabled, zoom-outs) is hashed and
/// compared with every registered hash; the smallest Hamming distance wins.
/// An unreachable registry yields `empty_registry` with
/// `registry_available: false` rather than an error.
#[utoipa::path(
    post,
    path = "/api/verify",
    tag = "Verification",
    request_body(content_type = "multipart/form-data", description = "Image to verify"),
    responses(
        (status = 200, description = "Verification completed", body = VerifyResponse),
        (status = 400, description = "Missing file or undecodable image"),
        (status = 413, description = "File too large"),
        (status = 500, description = "Every variant failed")
    )
)]
pub async fn verify_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<VerifyResponse>, ApiError> {
    let file = FileField::extract(&mut multipart, state.max_file_size).await?;

    let report = state
        .verifier
        .verify(
            &file.data,
            state.registry.as_ref(),
            state.asset_fetcher.as_deref(),
        )
        .await?;

    tracing::info!(
        verdict = %report.verdict,
        score = ?report.score,
        variant = report.variant.as_deref().unwrap_or("-"),
        "Verification complete"
    );

    Ok(Json(VerifyResponse::from_report(
        report,
        &state.registry.source(),
    )))
}
