//! Versioned matching policy.
//!
//! Every tunable that changes a verdict lives here, so two deployments with
//! the same policy version classify the same query identically.

use serde::{Deserialize, Serialize};

use crate::error::{Result, VerimarkError};
use crate::fingerprint::HASH_BITS;

/// Current policy revision.
pub const CURRENT_POLICY_VERSION: u32 = 1;

/// Default inclusive distance cutoff for a derivative verdict.
pub const DEFAULT_PLAGIARISM_THRESHOLD: u32 = 10;

/// Largest accepted zoom-out factor.
pub const MAX_ZOOM_FACTOR: f64 = 4.0;

/// Matching and classification policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchPolicy {
    /// Policy revision recorded with every verification report.
    pub version: u32,
    /// Inclusive maximum Hamming distance classified as `Derivative`.
    pub plagiarism_threshold: u32,
    /// Zoom-out factors appended after the eight symmetry variants.
    pub zoom_factors: Vec<f64>,
    /// Also try the mirrored form of each zoom factor.
    pub mirror_zoom: bool,
    /// On an exact perceptual match, compare raw bytes with the stored original.
    pub byte_check: bool,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            version: CURRENT_POLICY_VERSION,
            plagiarism_threshold: DEFAULT_PLAGIARISM_THRESHOLD,
            zoom_factors: Vec::new(),
            mirror_zoom: true,
            byte_check: true,
        }
    }
}

impl MatchPolicy {
    /// Policy with the zoom-out variants enabled at 1.25×, 1.5× and 2×.
    pub fn with_default_zoom() -> Self {
        Self {
            zoom_factors: vec![1.25, 1.5, 2.0],
            ..Default::default()
        }
    }

    /// Reject thresholds and zoom factors that cannot be honoured.
    pub fn validate(&self) -> Result<()> {
        if self.plagiarism_threshold > HASH_BITS {
            return Err(VerimarkError::Configuration(format!(
                "plagiarism_threshold {} exceeds hash width {HASH_BITS}",
                self.plagiarism_threshold
            )));
        }

        for (i, &factor) in self.zoom_factors.iter().enumerate() {
            if !factor.is_finite() || factor <= 1.0 || factor > MAX_ZOOM_FACTOR {
                return Err(VerimarkError::Configuration(format!(
                    "zoom factor {factor} must be in (1.0, {MAX_ZOOM_FACTOR}]"
                )));
            }
            if self.zoom_factors[..i].contains(&factor) {
                return Err(VerimarkError::Configuration(format!(
                    "zoom factor {factor} listed twice"
                )));
            }
        }

        Ok(())
    }

    /// Load the policy from environment variables, falling back to defaults
    /// for unset variables.
    ///
    /// - `PLAGIARISM_THRESHOLD` (u32)
    /// - `ZOOM_FACTORS` (comma-separated, e.g. `1.25,1.5,2.0`; empty disables)
    /// - `ZOOM_MIRROR` (`true`/`false`)
    /// - `DERIVATIVE_BYTE_CHECK` (`true`/`false`)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`MatchPolicy::from_env`] with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut policy = Self::default();

        if let Some(v) = lookup("PLAGIARISM_THRESHOLD") {
            policy.plagiarism_threshold = v.trim().parse().map_err(|_| {
                VerimarkError::Configuration(format!("PLAGIARISM_THRESHOLD is not a number: {v}"))
            })?;
        }

        if let Some(v) = lookup("ZOOM_FACTORS") {
            policy.zoom_factors = parse_factors(&v)?;
        }

        if let Some(v) = lookup("ZOOM_MIRROR") {
            policy.mirror_zoom = parse_bool("ZOOM_MIRROR", &v)?;
        }

        if let Some(v) = lookup("DERIVATIVE_BYTE_CHECK") {
            policy.byte_check = parse_bool("DERIVATIVE_BYTE_CHECK", &v)?;
        }

        policy.validate()?;
        Ok(policy)
    }
}

fn parse_factors(raw: &str) -> Result<Vec<f64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>().map_err(|_| {
                VerimarkError::Configuration(format!("ZOOM_FACTORS entry is not a number: {s}"))
            })
        })
        .collect()
}

fn parse_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(VerimarkError::Configuration(format!(
            "{name} must be true or false, got {raw}"
        ))),
    }
}
