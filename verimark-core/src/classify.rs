//! Verdicts from a match result.

use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use tracing::{debug, warn};

use crate::assets::AssetFetcher;
use crate::fingerprint::PerceptualHash;
use crate::matcher::MatchResult;
use crate::policy::MatchPolicy;

/// Final classification of a query image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Perceptually identical to a registered work, and not shown to differ byte-wise.
    Original,
    /// Close to a registered work, or identical in structure but a different file.
    Derivative,
    /// No registered work within the threshold.
    Clear,
    /// Nothing to compare against.
    EmptyRegistry,
}

impl Verdict {
    /// Label used by the public status field.
    pub fn status_label(self) -> &'static str {
        match self {
            Self::Original => "Original",
            Self::Derivative => "Plagiarism Detected",
            Self::Clear => "Clear",
            Self::EmptyRegistry => "No Registry",
        }
    }

    /// True when the query matches a registered work.
    pub fn is_match(self) -> bool {
        matches!(self, Self::Original | Self::Derivative)
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.status_label())
    }
}

/// Result of comparing query bytes with the stored original.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteComparison {
    Identical,
    Different,
    /// Original not stored, not fetched, or the fetch failed.
    Unavailable,
}

/// SHA3-256 of raw file bytes.
pub fn content_hash(bytes: &[u8]) -> [u8; 32] {
    Sha3_256::digest(bytes).into()
}

/// Classify a match. `comparison` only matters for exact matches.
pub fn classify(
    result: Option<&MatchResult>,
    comparison: ByteComparison,
    policy: &MatchPolicy,
) -> Verdict {
    let Some(result) = result else {
        return Verdict::EmptyRegistry;
    };

    match result.best_distance {
        0 if policy.byte_check && comparison == ByteComparison::Different => Verdict::Derivative,
        0 => Verdict::Original,
        d if d <= policy.plagiarism_threshold => Verdict::Derivative,
        _ => Verdict::Clear,
    }
}

/// Fetch the original stored under `hash` and compare its bytes with the query.
///
/// Fetch failures degrade to [`ByteComparison::Unavailable`].
pub async fn compare_with_original(
    fetcher: &dyn AssetFetcher,
    hash: PerceptualHash,
    query_bytes: &[u8],
) -> ByteComparison {
    match fetcher.fetch_original(hash).await {
        Ok(Some(original)) => {
            let same = content_hash(&original) == content_hash(query_bytes);
            debug!(hash = %hash, same, "Compared query with stored original");
            if same {
                ByteComparison::Identical
            } else {
                ByteComparison::Different
            }
        }
        Ok(None) => {
            debug!(hash = %hash, "No stored original");
            ByteComparison::Unavailable
        }
        Err(e) => {
            warn!(hash = %hash, error = %e, "Original fetch failed, skipping byte check");
            ByteComparison::Unavailable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetStore, InMemoryAssetStore};
    use crate::error::{Result, VerimarkError};
    use crate::registry::OwnerId;
    use crate::variants::{GeometricVariant, Symmetry};
    use async_trait::async_trait;

    fn result_with(distance: u32) -> MatchResult {
        MatchResult {
            best_distance: distance,
            matched_hash: PerceptualHash::from_u64(1),
            matched_owner: OwnerId::from("alice"),
            variant: GeometricVariant::Symmetry(Symmetry::Original),
            query_hash: PerceptualHash::from_u64(1),
            variants_evaluated: 1,
            variants_skipped: 0,
        }
    }

    #[test]
    fn test_no_result_is_empty_registry() {
        let policy = MatchPolicy::default();
        assert_eq!(
            classify(None, ByteComparison::Different, &policy),
            Verdict::EmptyRegistry
        );
    }

    #[test]
    fn test_exact_match() {
        let policy = MatchPolicy::default();
        let exact = result_with(0);
        assert_eq!(
            classify(Some(&exact), ByteComparison::Identical, &policy),
            Verdict::Original
        );
        assert_eq!(
            classify(Some(&exact), ByteComparison::Unavailable, &policy),
            Verdict::Original
        );
        assert_eq!(
            classify(Some(&exact), ByteComparison::Different, &policy),
            Verdict::Derivative
        );
    }

    #[test]
    fn test_byte_check_disabled() {
        let policy = MatchPolicy {
            byte_check: false,
            ..Default::default()
        };
        assert_eq!(
            classify(Some(&result_with(0)), ByteComparison::Different, &policy),
            Verdict::Original
        );
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let policy = MatchPolicy::default();
        let verdict = |d| classify(Some(&result_with(d)), ByteComparison::Unavailable, &policy);
        assert_eq!(verdict(6), Verdict::Derivative);
        assert_eq!(verdict(10), Verdict::Derivative);
        assert_eq!(verdict(11), Verdict::Clear);
        assert_eq!(verdict(64), Verdict::Clear);
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(Verdict::Derivative.status_label(), "Plagiarism Detected");
        assert_eq!(Verdict::EmptyRegistry.to_string(), "No Registry");
        assert!(Verdict::Original.is_match());
        assert!(!Verdict::Clear.is_match());
    }

    struct FailingFetcher;

    #[async_trait]
    impl AssetFetcher for FailingFetcher {
        async fn fetch_original(&self, _hash: PerceptualHash) -> Result<Option<Vec<u8>>> {
            Err(VerimarkError::ExternalUnavailable("down".into()))
        }
    }

    #[tokio::test]
    async fn test_compare_with_original() {
        let store = InMemoryAssetStore::new();
        let hash = PerceptualHash::from_u64(5);
        store.store_original(hash, b"original").await.unwrap();

        assert_eq!(
            compare_with_original(&store, hash, b"original").await,
            ByteComparison::Identical
        );
        assert_eq!(
            compare_with_original(&store, hash, b"traced copy").await,
            ByteComparison::Different
        );
        assert_eq!(
            compare_with_original(&store, PerceptualHash::from_u64(6), b"x").await,
            ByteComparison::Unavailable
        );
        assert_eq!(
            compare_with_original(&FailingFetcher, hash, b"x").await,
            ByteComparison::Unavailable
        );
    }
}
