//! Transform-invariant search of a query image against a registry snapshot.
//!
//! Every catalogue variant of the query is hashed and compared with every
//! registry entry. The best match is the first strictly smallest distance
//! seen in (variant order, registry order); a distance of 0 ends the search.

use image::DynamicImage;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Result, VerimarkError};
use crate::fingerprint::{hash_image, PerceptualHash};
use crate::registry::{OwnerId, RegistrySnapshot};
use crate::variants::{GeometricVariant, VariantCatalogue};

/// Outcome of one search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    /// Smallest Hamming distance found (0..=64).
    pub best_distance: u32,
    pub matched_hash: PerceptualHash,
    pub matched_owner: OwnerId,
    /// Variant that produced the best distance.
    #[serde(serialize_with = "serialize_variant")]
    pub variant: GeometricVariant,
    /// Hash of that variant of the query.
    pub query_hash: PerceptualHash,
    /// Variants hashed before the search ended, failures included.
    pub variants_evaluated: usize,
    /// Variants whose transform or hashing failed.
    pub variants_skipped: usize,
}

impl MatchResult {
    pub fn is_exact(&self) -> bool {
        self.best_distance == 0
    }
}

fn serialize_variant<S: serde::Serializer>(
    variant: &GeometricVariant,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&variant.name())
}

/// Search `registry` for the closest match to any variant of `query`.
///
/// Returns `Ok(None)` for an empty registry without hashing anything.
/// A failing variant is logged and skipped; only when every variant fails
/// is the search an error.
pub fn find_best_match(
    query: &DynamicImage,
    registry: &RegistrySnapshot,
    catalogue: &VariantCatalogue,
) -> Result<Option<MatchResult>> {
    if registry.is_empty() {
        debug!("Registry is empty, skipping search");
        return Ok(None);
    }

    let mut best: Option<MatchResult> = None;
    let mut evaluated = 0usize;
    let mut skipped = 0usize;
    let mut last_error = None;

    'variants: for (variant, image) in catalogue.variants(query) {
        evaluated += 1;

        let candidate = match image.and_then(|img| {
            hash_image(&img).map_err(|e| VerimarkError::variant(variant.name(), e.to_string()))
        }) {
            Ok(hash) => hash,
            Err(e) => {
                warn!(variant = %variant, error = %e, "Skipping variant");
                skipped += 1;
                last_error = Some(e);
                continue;
            }
        };

        for entry in registry {
            let distance = candidate.hamming_distance(entry.hash);
            if best.as_ref().map_or(true, |b| distance < b.best_distance) {
                debug!(variant = %variant, hash = %entry.hash, distance, "New best match");
                best = Some(MatchResult {
                    best_distance: distance,
                    matched_hash: entry.hash,
                    matched_owner: entry.owner.clone(),
                    variant: *variant,
                    query_hash: candidate,
                    variants_evaluated: 0,
                    variants_skipped: 0,
                });
                if distance == 0 {
                    break 'variants;
                }
            }
        }
    }

    match best {
        Some(mut result) => {
            result.variants_evaluated = evaluated;
            result.variants_skipped = skipped;
            Ok(Some(result))
        }
        None => Err(last_error.unwrap_or_else(|| {
            VerimarkError::variant("all", "variant catalogue is empty")
        })),
    }
}
