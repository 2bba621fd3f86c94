//! Perceptual fingerprinting pipeline.
//!
//! raw bytes → [`preprocess`] → [`dct`] → [`encode`] → [`PerceptualHash`]
//!
//! # Usage
//!
//! ```no_run
//! use verimark_core::fingerprint::{hash_bytes, hamming_distance};
//!
//! let a = hash_bytes(&std::fs::read("artwork.png").unwrap()).unwrap();
//! let b = hash_bytes(&std::fs::read("suspect.jpg").unwrap()).unwrap();
//! let similar = hamming_distance(a, b) <= 10;
//! ```

pub mod analysis;
pub mod dct;
pub mod encode;
pub mod hash;
pub mod preprocess;

pub use analysis::{analyze, Analysis, AnalysisSummary};
pub use dct::{FrequencyBlock, BLOCK_LEN, BLOCK_SIZE};
pub use hash::{hamming_distance, PerceptualHash, HASH_BITS, HASH_HEX_LEN};
pub use preprocess::{decode_image, GraySample, MAX_PIXELS, SAMPLE_LEN, SAMPLE_SIZE};

use image::DynamicImage;

use crate::error::Result;

/// Hash an already decoded image.
pub fn hash_image(image: &DynamicImage) -> Result<PerceptualHash> {
    let sample = preprocess::preprocess(image)?;
    let block = dct::transform(&sample.to_f64());
    Ok(encode::encode(&block))
}

/// Decode and hash raw image bytes (JPEG, PNG, GIF or WebP).
pub fn hash_bytes(data: &[u8]) -> Result<PerceptualHash> {
    hash_image(&decode_image(data)?)
}

/// Cheap signature check: true when the bytes start like an image this
/// build can decode. Decoding may still fail on a corrupt body.
pub fn is_supported_format(data: &[u8]) -> bool {
    image::guess_format(data).is_ok_and(|format| format.reading_enabled())
}
