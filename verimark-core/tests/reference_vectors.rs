//! Fixed reference vectors for the perceptual hash.
//!
//! Registered hashes are persisted outside this crate and compared against
//! fresh ones long after they were written. Any change to luminance weights,
//! the median filter, resampling, the DCT or bit order shows up here.

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use verimark_core::fingerprint::dct::dct_2d;
use verimark_core::fingerprint::{hash_bytes, hash_image};
use verimark_core::{analyze, PerceptualHash};

/// 32×32, so the resampler is bypassed and the result is exact.
fn plate_32() -> RgbImage {
    RgbImage::from_fn(32, 32, |x, y| {
        let b = if (8..20).contains(&x) && (4..14).contains(&y) {
            230
        } else {
            30 + x * 3
        };
        Rgb([(x * 5 + y * 2) as u8, (40 + y * 6) as u8, b as u8])
    })
}

/// 64×64, downsampled by the Lanczos3 resampler.
fn plate_64() -> RgbImage {
    RgbImage::from_fn(64, 64, |x, y| {
        let (dx, dy) = (x as i32 - 21, y as i32 - 27);
        let r = if dx * dx + dy * dy < 200 { 230 } else { 31 + y * 2 };
        let g = if x > 41 { 97 } else { 151 };
        Rgb([r as u8, g, ((x + y) * 2 % 256) as u8])
    })
}

fn png(img: RgbImage) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buffer, ImageFormat::Png)
        .expect("PNG encoding failed");
    buffer.into_inner()
}

#[test]
fn test_reference_hash_without_resampling() {
    let hash = hash_image(&DynamicImage::ImageRgb8(plate_32())).unwrap();
    assert_eq!(hash.to_hex(), "8b4f3230303ecf73");
}

#[test]
fn test_reference_hash_with_resampling() {
    let hash = hash_image(&DynamicImage::ImageRgb8(plate_64())).unwrap();
    assert_eq!(hash.to_hex(), "c9443b3bc8d8c6c7");
}

#[test]
fn test_reference_hashes_survive_png_encoding() {
    assert_eq!(
        hash_bytes(&png(plate_32())).unwrap(),
        PerceptualHash::from_hex("8b4f3230303ecf73").unwrap()
    );
    assert_eq!(
        hash_bytes(&png(plate_64())).unwrap(),
        PerceptualHash::from_hex("c9443b3bc8d8c6c7").unwrap()
    );
}

#[test]
fn test_reference_bit_string_starts_with_dc() {
    let analysis = analyze(&png(plate_32())).unwrap();
    let binary = analysis.binary();
    assert_eq!(
        binary,
        "1000101101001111001100100011000000110000001111101100111101110011"
    );
    assert_eq!(u64::from_str_radix(&binary, 2).unwrap(), 0x8b4f_3230_303e_cf73);
}

#[test]
fn test_dct_matches_reference_orthonormal_dct_ii() {
    // Direct double sum of the orthonormal DCT-II (scipy `dctn(norm="ortho")`)
    let input: Vec<f64> = (0..64).map(|i| ((i * 37) % 17) as f64 - 8.0).collect();
    let out = dct_2d(&input, 8);

    let reference = [
        ((0, 0), -0.7500000000000002),
        ((0, 1), -4.602821366751737),
        ((1, 0), -1.7739929717081184),
        ((1, 1), 0.8802038200428264),
        ((2, 5), 4.754623622689978),
        ((3, 6), 4.11135732738092),
        ((7, 7), 0.8802038200428484),
    ];
    for ((k, l), expected) in reference {
        let actual = out[k * 8 + l];
        assert!(
            (actual - expected).abs() < 1e-9,
            "coefficient ({k}, {l}): {actual} != {expected}"
        );
    }
}
