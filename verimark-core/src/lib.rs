//! Verimark Core - perceptual fingerprinting and registry matching for artwork
//!
//! This crate turns images into 64-bit perceptual hashes and matches a
//! submitted image against a registry of previously fingerprinted works,
//! detecting exact reproductions and disguised derivatives.
//!
//! # Features
//!
//! - Deterministic DCT perceptual hash with a 3×3 median denoise pass
//! - Search across the eight symmetries of the square plus optional zoom-out
//! - Versioned [`MatchPolicy`] holding every verdict-affecting tunable
//! - Read-only registry adapters (in-memory, Algorand box storage)
//! - Optional byte-level comparison with stored originals
//!
//! # Example
//!
//! ```no_run
//! use verimark_core::{InMemoryRegistry, MatchPolicy, Verdict, Verifier};
//!
//! # async fn example() -> verimark_core::Result<()> {
//! let verifier = Verifier::new(MatchPolicy::default())?;
//! let original = std::fs::read("artwork.png").unwrap();
//!
//! let registry = InMemoryRegistry::new();
//! registry.register(verifier.compute_hash(&original)?, "alice");
//!
//! let report = verifier.verify(&original, &registry, None).await?;
//! assert_eq!(report.verdict, Verdict::Original);
//! # Ok(())
//! # }
//! ```

pub mod assets;
pub mod classify;
pub mod error;
pub mod fingerprint;
pub mod matcher;
pub mod policy;
pub mod registry;
pub mod variants;
pub mod verifier;

#[cfg(feature = "network")]
pub(crate) mod http_client;

// Re-export main types for convenience
pub use assets::{AssetFetcher, AssetStore, InMemoryAssetStore};
pub use classify::{classify, compare_with_original, content_hash, ByteComparison, Verdict};
pub use error::{Result, VerimarkError};
pub use fingerprint::{analyze, hamming_distance, hash_bytes, hash_image, Analysis, PerceptualHash};
pub use matcher::{find_best_match, MatchResult};
pub use policy::{MatchPolicy, CURRENT_POLICY_VERSION, DEFAULT_PLAGIARISM_THRESHOLD};
pub use registry::{
    InMemoryRegistry, OwnerId, RawRecord, RegistryEntry, RegistryProvider, RegistrySnapshot,
    RegistrySource,
};
pub use variants::{GeometricVariant, Symmetry, VariantCatalogue};
pub use verifier::{HashReceipt, VerificationReport, Verifier};

// Network-dependent exports
#[cfg(feature = "network")]
pub use assets::{HttpAssetStore, HttpAssetStoreConfig};
#[cfg(feature = "network")]
pub use registry::{AlgodConfig, AlgodRegistry};
