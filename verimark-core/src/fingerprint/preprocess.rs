//! Canonicalization of a decoded image into a 32×32 luminance sample.
//!
//! Pipeline: RGB → 3×3 median (per channel) → BT.601 luminance → Lanczos3
//! resample. The median pass removes isolated pixel perturbations that could
//! otherwise flip threshold bits without visibly changing the artwork.

use std::io::Cursor;

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, ImageReader, Limits, Luma, RgbImage};

use crate::error::{Result, VerimarkError};

/// Side length of the canonical sample.
pub const SAMPLE_SIZE: usize = 32;

/// Number of pixels in the canonical sample.
pub const SAMPLE_LEN: usize = SAMPLE_SIZE * SAMPLE_SIZE;

/// Largest image, in pixels, that is decoded or synthesized.
pub const MAX_PIXELS: u64 = 40_000_000;

// 16-bit RGBA
const MAX_BYTES_PER_PIXEL: u64 = 8;

/// A 32×32 8-bit grayscale sample in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraySample {
    pixels: Vec<u8>,
}

impl GraySample {
    fn from_gray(gray: &GrayImage) -> Self {
        let resized = imageops::resize(
            gray,
            SAMPLE_SIZE as u32,
            SAMPLE_SIZE as u32,
            FilterType::Lanczos3,
        );
        Self {
            pixels: resized.into_raw(),
        }
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Pixel values promoted to `f64` for the frequency transform.
    pub fn to_f64(&self) -> [f64; SAMPLE_LEN] {
        let mut out = [0.0; SAMPLE_LEN];
        for (dst, &src) in out.iter_mut().zip(&self.pixels) {
            *dst = f64::from(src);
        }
        out
    }

    pub fn to_image(&self) -> GrayImage {
        // Length is fixed at construction.
        GrayImage::from_fn(SAMPLE_SIZE as u32, SAMPLE_SIZE as u32, |x, y| {
            Luma([self.pixels[y as usize * SAMPLE_SIZE + x as usize]])
        })
    }

    /// Encode the sample as a PNG image.
    pub fn to_png(&self) -> Result<Vec<u8>> {
        let mut buffer = std::io::Cursor::new(Vec::new());
        DynamicImage::ImageLuma8(self.to_image())
            .write_to(&mut buffer, image::ImageFormat::Png)
            .map_err(|e| VerimarkError::InvalidImage(format!("Failed to encode PNG: {e}")))?;
        Ok(buffer.into_inner())
    }
}

/// Decode raw upload bytes.
///
/// Images larger than [`MAX_PIXELS`] are rejected from their header, before
/// any pixel buffer is allocated.
pub fn decode_image(data: &[u8]) -> Result<DynamicImage> {
    decode_within(data, MAX_PIXELS)
}

pub(crate) fn decode_within(data: &[u8], max_pixels: u64) -> Result<DynamicImage> {
    let reader = || {
        ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| VerimarkError::InvalidImage(format!("Failed to read image: {e}")))
    };

    let (width, height) = reader()?
        .into_dimensions()
        .map_err(|e| VerimarkError::InvalidImage(format!("Failed to decode image: {e}")))?;
    if !within_pixel_budget(width, height, max_pixels) {
        return Err(VerimarkError::InvalidImage(format!(
            "Image of {width}x{height} exceeds the {max_pixels} pixel limit"
        )));
    }

    let mut limits = Limits::default();
    limits.max_alloc = Some(max_pixels.saturating_mul(MAX_BYTES_PER_PIXEL));
    let mut decoder = reader()?;
    decoder.limits(limits);
    decoder
        .decode()
        .map_err(|e| VerimarkError::InvalidImage(format!("Failed to decode image: {e}")))
}

pub(crate) fn within_pixel_budget(width: u32, height: u32, max_pixels: u64) -> bool {
    u64::from(width) * u64::from(height) <= max_pixels
}

/// Canonicalize an image into the denoised 32×32 sample that gets hashed.
pub fn preprocess(image: &DynamicImage) -> Result<GraySample> {
    let rgb = to_rgb(image)?;
    let denoised = median_filter_3x3(&rgb);
    Ok(GraySample::from_gray(&luminance(&denoised)))
}

/// Same canonicalization without the median pass, for diagnostics.
pub fn preprocess_without_denoise(image: &DynamicImage) -> Result<GraySample> {
    let rgb = to_rgb(image)?;
    Ok(GraySample::from_gray(&luminance(&rgb)))
}

fn to_rgb(image: &DynamicImage) -> Result<RgbImage> {
    if image.width() == 0 || image.height() == 0 {
        return Err(VerimarkError::InvalidImage(format!(
            "Image has no pixels ({}x{})",
            image.width(),
            image.height()
        )));
    }
    Ok(image.to_rgb8())
}

/// 3×3 median over each channel, replicating edge pixels.
pub fn median_filter_3x3(rgb: &RgbImage) -> RgbImage {
    let (w, h) = rgb.dimensions();
    let src = rgb.as_raw();
    let stride = w as usize * 3;
    let mut out = RgbImage::new(w, h);
    let dst: &mut [u8] = &mut out;
    let mut window = [0u8; 9];

    for y in 0..h as usize {
        for x in 0..w as usize {
            for c in 0..3 {
                let mut n = 0;
                for dy in 0..3 {
                    let sy = (y + dy).saturating_sub(1).min(h as usize - 1);
                    for dx in 0..3 {
                        let sx = (x + dx).saturating_sub(1).min(w as usize - 1);
                        window[n] = src[sy * stride + sx * 3 + c];
                        n += 1;
                    }
                }
                window.sort_unstable();
                dst[y * stride + x * 3 + c] = window[4];
            }
        }
    }
    out
}

/// ITU-R BT.601 luminance with the fixed-point weights used when the
/// registry hashes were first produced.
pub fn luminance(rgb: &RgbImage) -> GrayImage {
    let (w, h) = rgb.dimensions();
    let mut gray = GrayImage::new(w, h);
    for (dst, px) in gray.pixels_mut().zip(rgb.pixels()) {
        let [r, g, b] = px.0;
        let l = (u32::from(r) * 19595 + u32::from(g) * 38470 + u32::from(b) * 7471 + 0x8000) >> 16;
        *dst = Luma([l as u8]);
    }
    gray
}
