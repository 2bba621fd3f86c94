//! HTTP request handlers
//!
//! This module contains all the request handlers for the API endpoints.

pub mod analyze;
pub mod hash;
pub mod health;
pub mod registry;
pub mod verify;

pub use crate::state::AppState;
pub use analyze::{analyze_handler, AnalyzeResponse};
pub use hash::{compute_hash_handler, ComputeHashResponse};
pub use health::{health, ready, HealthResponse, ReadyResponse};
pub use registry::{registry_handler, RegistryHash, RegistryResponse};
pub use verify::{verify_handler, VerifyResponse};

use crate::error::ApiError;

/// Run CPU-bound pipeline work on the blocking pool so the request timeout
/// stays effective.
pub(crate) async fn run_blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> verimark_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let outcome = tokio::task::spawn_blocking(work)
        .await
        .map_err(verimark_core::VerimarkError::from)?;
    Ok(outcome?)
}
