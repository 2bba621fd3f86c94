//! Orthonormal type-II DCT over the 32×32 sample.
//!
//! The transform is separable: rows first, then columns. Only the top-left
//! 8×8 block (lowest spatial frequencies, DC at `[0][0]`) is kept.

use std::f64::consts::PI;

use super::preprocess::{SAMPLE_LEN, SAMPLE_SIZE};

/// Side length of the retained low-frequency block.
pub const BLOCK_SIZE: usize = 8;

/// Number of coefficients in the low-frequency block.
pub const BLOCK_LEN: usize = BLOCK_SIZE * BLOCK_SIZE;

/// Row-major 8×8 block of DCT coefficients.
pub type FrequencyBlock = [f64; BLOCK_LEN];

/// Precomputed orthonormal DCT-II basis for one dimension.
struct DctBasis {
    // basis[k * n + i] = s_k * cos(pi / n * (i + 0.5) * k)
    basis: Vec<f64>,
    n: usize,
}

impl DctBasis {
    fn new(n: usize) -> Self {
        let mut basis = Vec::with_capacity(n * n);
        let nf = n as f64;
        for k in 0..n {
            let scale = if k == 0 {
                (1.0 / nf).sqrt()
            } else {
                (2.0 / nf).sqrt()
            };
            for i in 0..n {
                basis.push(scale * (PI / nf * (i as f64 + 0.5) * k as f64).cos());
            }
        }
        Self { basis, n }
    }

    /// Transform `input` (length `n`, read with `stride`) into the first
    /// `keep` coefficients.
    fn transform(&self, input: &[f64], stride: usize, keep: usize, out: &mut [f64]) {
        for (k, coeff) in out.iter_mut().enumerate().take(keep) {
            let row = &self.basis[k * self.n..(k + 1) * self.n];
            let mut acc = 0.0;
            for (i, &b) in row.iter().enumerate() {
                acc += b * input[i * stride];
            }
            *coeff = acc;
        }
    }
}

/// Full 2-D orthonormal DCT-II of an `n`×`n` row-major matrix.
pub fn dct_2d(input: &[f64], n: usize) -> Vec<f64> {
    debug_assert_eq!(input.len(), n * n);
    let basis = DctBasis::new(n);

    let mut rows = vec![0.0; n * n];
    for r in 0..n {
        basis.transform(&input[r * n..], 1, n, &mut rows[r * n..(r + 1) * n]);
    }

    let mut out = vec![0.0; n * n];
    let mut column = vec![0.0; n];
    for c in 0..n {
        basis.transform(&rows[c..], n, n, &mut column);
        for (r, &v) in column.iter().enumerate() {
            out[r * n + c] = v;
        }
    }
    out
}

/// Transform the 32×32 sample and keep the low-frequency 8×8 block.
pub fn transform(sample: &[f64; SAMPLE_LEN]) -> FrequencyBlock {
    let full = dct_2d(sample, SAMPLE_SIZE);
    let mut block = [0.0; BLOCK_LEN];
    for r in 0..BLOCK_SIZE {
        block[r * BLOCK_SIZE..(r + 1) * BLOCK_SIZE]
            .copy_from_slice(&full[r * SAMPLE_SIZE..r * SAMPLE_SIZE + BLOCK_SIZE]);
    }
    block
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_constant_input_has_only_dc() {
        let sample = [10.0; SAMPLE_LEN];
        let block = transform(&sample);
        // Orthonormal DC for an N×N constant c is N * c.
        assert!(approx(block[0], 32.0 * 10.0));
        assert!(block[1..].iter().all(|&v| approx(v, 0.0)));
    }

    #[test]
    fn test_orthonormal_preserves_energy() {
        let n = 8;
        let input: Vec<f64> = (0..n * n).map(|i| ((i * 37) % 17) as f64 - 8.0).collect();
        let out = dct_2d(&input, n);
        let e_in: f64 = input.iter().map(|v| v * v).sum();
        let e_out: f64 = out.iter().map(|v| v * v).sum();
        assert!((e_in - e_out).abs() < 1e-6);
    }

    #[test]
    fn test_horizontal_cosine_lands_in_first_row() {
        // A single horizontal frequency k=3 should only excite [0][3].
        let mut sample = [0.0; SAMPLE_LEN];
        for r in 0..SAMPLE_SIZE {
            for c in 0..SAMPLE_SIZE {
                sample[r * SAMPLE_SIZE + c] =
                    (PI / SAMPLE_SIZE as f64 * (c as f64 + 0.5) * 3.0).cos();
            }
        }
        let block = transform(&sample);
        for (i, &v) in block.iter().enumerate() {
            if i == 3 {
                assert!(v.abs() > 1.0);
            } else {
                assert!(approx(v, 0.0), "coefficient {i} = {v}");
            }
        }
    }

    #[test]
    fn test_transform_is_deterministic() {
        let sample: [f64; SAMPLE_LEN] = std::array::from_fn(|i| ((i * 131) % 256) as f64);
        assert_eq!(transform(&sample), transform(&sample));
    }
}
