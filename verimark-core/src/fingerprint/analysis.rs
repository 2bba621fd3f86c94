//! Diagnostic view of every intermediate artifact of the hashing pipeline.
//!
//! Used for forensic display only; verdicts never depend on it.

use serde::Serialize;

use super::dct::{self, FrequencyBlock, BLOCK_LEN};
use super::encode::{ac_median, encode_with_median};
use super::hash::PerceptualHash;
use super::preprocess::{decode_image, preprocess, preprocess_without_denoise, GraySample};
use crate::error::Result;

/// Intermediate artifacts for one image.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Denoised 32×32 sample (the one that gets hashed).
    pub gray_denoised: GraySample,
    /// 32×32 sample without the median pass.
    pub gray_original: GraySample,
    /// Raw low-frequency coefficients, row-major.
    pub frequency_block: FrequencyBlock,
    /// Threshold used for the bits.
    pub median: f64,
    pub hash: PerceptualHash,
}

impl Analysis {
    /// Coefficients min-max normalized into `0..=255` for heatmap display.
    pub fn heatmap(&self) -> [f64; BLOCK_LEN] {
        normalize_heatmap(&self.frequency_block)
    }

    pub fn bits(&self) -> [u8; BLOCK_LEN] {
        self.hash.bits()
    }

    /// The bitmask as a 64-character string of `0`/`1`.
    pub fn binary(&self) -> String {
        self.bits().iter().map(|&b| if b == 1 { '1' } else { '0' }).collect()
    }

    /// Flatten into a serializable summary (samples as raw pixel lists).
    pub fn summary(&self) -> AnalysisSummary {
        AnalysisSummary {
            hash: self.hash,
            binary: self.binary(),
            median: self.median,
            bits: self.bits().to_vec(),
            frequency_block: self.frequency_block.to_vec(),
            heatmap: self.heatmap().to_vec(),
            gray_denoised: self.gray_denoised.pixels().to_vec(),
            gray_original: self.gray_original.pixels().to_vec(),
        }
    }
}

/// Serializable form of [`Analysis`].
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSummary {
    pub hash: PerceptualHash,
    pub binary: String,
    pub median: f64,
    pub bits: Vec<u8>,
    pub frequency_block: Vec<f64>,
    pub heatmap: Vec<f64>,
    pub gray_denoised: Vec<u8>,
    pub gray_original: Vec<u8>,
}

/// Run the full pipeline on raw image bytes, keeping every artifact.
pub fn analyze(data: &[u8]) -> Result<Analysis> {
    let image = decode_image(data)?;
    let gray_denoised = preprocess(&image)?;
    let gray_original = preprocess_without_denoise(&image)?;

    let frequency_block = dct::transform(&gray_denoised.to_f64());
    let median = ac_median(&frequency_block);
    let hash = encode_with_median(&frequency_block, median);

    tracing::debug!(hash = %hash, median, "Analyzed image");

    Ok(Analysis {
        gray_denoised,
        gray_original,
        frequency_block,
        median,
        hash,
    })
}

fn normalize_heatmap(block: &FrequencyBlock) -> [f64; BLOCK_LEN] {
    let min = block.iter().copied().fold(f64::INFINITY, f64::min);
    let max = block.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == min {
        return [0.0; BLOCK_LEN];
    }
    std::array::from_fn(|i| (block[i] - min) / (max - min) * 255.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heatmap_range() {
        let block: FrequencyBlock = std::array::from_fn(|i| i as f64 - 10.0);
        let heat = normalize_heatmap(&block);
        assert_eq!(heat[0], 0.0);
        assert_eq!(heat[63], 255.0);
        assert!(heat.iter().all(|&v| (0.0..=255.0).contains(&v)));
    }

    #[test]
    fn test_heatmap_constant_block() {
        let heat = normalize_heatmap(&[4.2; BLOCK_LEN]);
        assert!(heat.iter().all(|&v| v == 0.0));
    }
}
