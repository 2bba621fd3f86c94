//! Operations exposed to the HTTP and CLI front ends.
//!
//! ```no_run
//! use verimark_core::{InMemoryRegistry, MatchPolicy, Verifier};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let verifier = Verifier::new(MatchPolicy::default())?;
//! let bytes = std::fs::read("suspect.jpg")?;
//! let registry = InMemoryRegistry::new();
//!
//! let report = verifier.verify(&bytes, &registry, None).await?;
//! println!("{}: {:?}", report.verdict, report.detection_method);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use image::DynamicImage;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::assets::{AssetFetcher, AssetStore};
use crate::classify::{classify, compare_with_original, ByteComparison, Verdict};
use crate::error::Result;
use crate::fingerprint::{decode_image, hash_bytes, PerceptualHash};
use crate::matcher::{find_best_match, MatchResult};
use crate::policy::MatchPolicy;
use crate::registry::{OwnerId, RegistryEntry, RegistryProvider, RegistrySnapshot};
use crate::variants::VariantCatalogue;

/// Result of hashing (and optionally storing) a submitted work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HashReceipt {
    pub hash: PerceptualHash,
    /// Public URL of the stored original, when the store reports one.
    pub asset_url: Option<String>,
    pub asset_stored: bool,
}

/// Everything a caller needs to present a verification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationReport {
    pub verdict: Verdict,
    /// Best Hamming distance, absent when nothing was compared.
    pub score: Option<u32>,
    pub matched_hash: Option<PerceptualHash>,
    pub owner: Option<OwnerId>,
    /// Name of the variant that produced the best distance.
    pub variant: Option<String>,
    pub detection_method: Option<String>,
    pub variants_evaluated: usize,
    pub variants_skipped: usize,
    pub policy_version: u32,
    pub registry_size: usize,
    /// False when the registry could not be fetched.
    pub registry_available: bool,
}

impl VerificationReport {
    fn empty(policy: &MatchPolicy, registry_available: bool) -> Self {
        Self {
            verdict: Verdict::EmptyRegistry,
            score: None,
            matched_hash: None,
            owner: None,
            variant: None,
            detection_method: None,
            variants_evaluated: 0,
            variants_skipped: 0,
            policy_version: policy.version,
            registry_size: 0,
            registry_available,
        }
    }
}

/// Fingerprinting and matching under one policy.
#[derive(Debug, Clone)]
pub struct Verifier {
    policy: MatchPolicy,
    catalogue: Arc<VariantCatalogue>,
}

impl Verifier {
    /// Validate `policy` and build the variant catalogue it describes.
    pub fn new(policy: MatchPolicy) -> Result<Self> {
        policy.validate()?;
        let catalogue = Arc::new(VariantCatalogue::from_policy(&policy));
        Ok(Self { policy, catalogue })
    }

    pub fn policy(&self) -> &MatchPolicy {
        &self.policy
    }

    pub fn catalogue(&self) -> &VariantCatalogue {
        &self.catalogue
    }

    /// Perceptual hash of an uploaded file.
    ///
    /// Runs on the calling thread; async callers should go through
    /// [`Verifier::register_asset`] or their own blocking pool.
    pub fn compute_hash(&self, bytes: &[u8]) -> Result<PerceptualHash> {
        hash_bytes(bytes)
    }

    /// Hash an upload and store its bytes. Storage is best effort.
    #[instrument(skip_all, fields(size = bytes.len()))]
    pub async fn register_asset(&self, bytes: &[u8], store: &dyn AssetStore) -> Result<HashReceipt> {
        let data = bytes.to_vec();
        let hash = run_blocking(move || hash_bytes(&data)).await?;

        let (asset_url, asset_stored) = match store.store_original(hash, bytes).await {
            Ok(url) => (url, true),
            Err(e) => {
                warn!(hash = %hash, error = %e, "Asset upload failed, continuing without it");
                (None, false)
            }
        };

        info!(hash = %hash, asset_stored, "Computed hash");
        Ok(HashReceipt {
            hash,
            asset_url,
            asset_stored,
        })
    }

    /// Verify an upload against a freshly fetched registry.
    ///
    /// An undecodable upload is an error. An unreachable registry is not:
    /// the report says `EmptyRegistry` with `registry_available == false`.
    #[instrument(skip_all, fields(size = bytes.len(), registry = %registry.source()))]
    pub async fn verify(
        &self,
        bytes: &[u8],
        registry: &dyn RegistryProvider,
        fetcher: Option<&dyn AssetFetcher>,
    ) -> Result<VerificationReport> {
        let query = decode_offloaded(bytes).await?;

        let snapshot = match registry.snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "Registry unavailable, reporting empty registry");
                return Ok(VerificationReport::empty(&self.policy, false));
            }
        };

        self.verify_image(query, bytes, snapshot, fetcher).await
    }

    /// Verify an upload against an explicit snapshot.
    pub async fn verify_snapshot(
        &self,
        bytes: &[u8],
        snapshot: &RegistrySnapshot,
        fetcher: Option<&dyn AssetFetcher>,
    ) -> Result<VerificationReport> {
        let query = decode_offloaded(bytes).await?;
        self.verify_image(query, bytes, snapshot.clone(), fetcher).await
    }

    /// Current registry contents.
    pub async fn list_registry(&self, registry: &dyn RegistryProvider) -> Result<Vec<RegistryEntry>> {
        Ok(registry.snapshot().await?.into_entries())
    }

    async fn verify_image(
        &self,
        query: DynamicImage,
        bytes: &[u8],
        snapshot: RegistrySnapshot,
        fetcher: Option<&dyn AssetFetcher>,
    ) -> Result<VerificationReport> {
        let registry_size = snapshot.len();
        let catalogue = Arc::clone(&self.catalogue);
        let outcome = run_blocking(move || find_best_match(&query, &snapshot, &catalogue)).await?;

        let Some(result) = outcome else {
            info!(verdict = %Verdict::EmptyRegistry, "Verification complete");
            return Ok(VerificationReport::empty(&self.policy, true));
        };

        // Only the untransformed query can be compared byte for byte.
        let comparison = match fetcher {
            Some(fetcher)
                if result.is_exact() && result.variant.is_identity() && self.policy.byte_check =>
            {
                compare_with_original(fetcher, result.matched_hash, bytes).await
            }
            _ => ByteComparison::Unavailable,
        };

        let verdict = classify(Some(&result), comparison, &self.policy);
        info!(
            verdict = %verdict,
            distance = result.best_distance,
            variant = %result.variant,
            "Verification complete"
        );

        Ok(self.report(verdict, result, registry_size))
    }

    fn report(&self, verdict: Verdict, result: MatchResult, registry_size: usize) -> VerificationReport {
        let description = result.variant.description();
        let detection_method = if verdict.is_match() {
            format!("Detected via {description}")
        } else {
            format!(
                "All {} variants tested — best: {description} (dist={})",
                result.variants_evaluated, result.best_distance
            )
        };

        let matched = verdict.is_match();
        VerificationReport {
            verdict,
            score: Some(result.best_distance),
            matched_hash: matched.then_some(result.matched_hash),
            owner: matched.then(|| result.matched_owner.clone()),
            variant: Some(result.variant.name()),
            detection_method: Some(detection_method),
            variants_evaluated: result.variants_evaluated,
            variants_skipped: result.variants_skipped,
            policy_version: self.policy.version,
            registry_size,
            registry_available: true,
        }
    }
}

async fn decode_offloaded(bytes: &[u8]) -> Result<DynamicImage> {
    let data = bytes.to_vec();
    run_blocking(move || decode_image(&data)).await
}

/// Run CPU-bound pipeline work on the blocking pool, so the executor keeps
/// serving other tasks and callers' timeouts can fire.
#[cfg(feature = "network")]
async fn run_blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await?
}

#[cfg(not(feature = "network"))]
async fn run_blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    work()
}
