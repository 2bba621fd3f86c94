//! Median thresholding of the frequency block into a 64-bit hash.

use super::dct::{FrequencyBlock, BLOCK_LEN};
use super::hash::PerceptualHash;

/// Median of the 63 AC coefficients (the DC term at index 0 is excluded).
pub fn ac_median(block: &FrequencyBlock) -> f64 {
    let mut ac: Vec<f64> = block[1..].to_vec();
    ac.sort_by(f64::total_cmp);
    let mid = ac.len() / 2;
    if ac.len() % 2 == 1 {
        ac[mid]
    } else {
        (ac[mid - 1] + ac[mid]) / 2.0
    }
}

/// Threshold every coefficient (DC included) against the AC median.
///
/// Bit `i` of the row-major order becomes bit `63 - i` of the result; ties
/// with the median encode as `0`.
pub fn encode(block: &FrequencyBlock) -> PerceptualHash {
    encode_with_median(block, ac_median(block))
}

pub(crate) fn encode_with_median(block: &FrequencyBlock, median: f64) -> PerceptualHash {
    let value = block
        .iter()
        .fold(0u64, |acc, &c| (acc << 1) | u64::from(c > median));
    debug_assert_eq!(block.len(), BLOCK_LEN);
    PerceptualHash::from_u64(value)
}
