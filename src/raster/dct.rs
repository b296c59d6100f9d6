// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Orthonormal 8×8 DCT-II and its inverse.
//!
//! Same basis as baseline JPEG: `F(u,v) = C(u) C(v) Σ f(x,y) cos(..) cos(..)`
//! with `C(0) = 1/sqrt(8)` and `C(u>0) = 1/2`. Samples are level-shifted by
//! 128 so coefficients line up with what a JPEG encoder quantizes.

use std::sync::OnceLock;

/// Pre-computed 8×8 cosine table.
/// `COSINE[u][x] = cos((2*x + 1) * u * PI / 16)`
static COSINE: OnceLock<[[f64; 8]; 8]> = OnceLock::new();

/// Normalization constants: C(0) = 1/sqrt(8), C(u>0) = 1/2.
static NORM: OnceLock<[f64; 8]> = OnceLock::new();

fn cosine_table() -> &'static [[f64; 8]; 8] {
    COSINE.get_or_init(|| {
        let mut table = [[0.0f64; 8]; 8];
        for (u, row) in table.iter_mut().enumerate() {
            for (x, v) in row.iter_mut().enumerate() {
                *v = ((2 * x + 1) as f64 * u as f64 * std::f64::consts::PI / 16.0).cos();
            }
        }
        table
    })
}

fn norm_table() -> &'static [f64; 8] {
    NORM.get_or_init(|| {
        let mut n = [0.5f64; 8];
        n[0] = 1.0 / (8.0f64).sqrt();
        n
    })
}

/// Forward DCT of 64 samples in row-major order (expected ~0–255).
///
/// Output coefficients are in natural (row-major) order: index `v * 8 + u`
/// where `v` is the vertical and `u` the horizontal frequency.
pub fn fdct_8x8(samples: &[f64; 64]) -> [f64; 64] {
    let cos = cosine_table();
    let c = norm_table();

    // Rows.
    let mut temp = [0.0f64; 64];
    for row in 0..8 {
        for u in 0..8 {
            let mut sum = 0.0;
            for x in 0..8 {
                sum += (samples[row * 8 + x] - 128.0) * cos[u][x];
            }
            temp[row * 8 + u] = c[u] * sum;
        }
    }

    // Columns.
    let mut coeffs = [0.0f64; 64];
    for col in 0..8 {
        for v in 0..8 {
            let mut sum = 0.0;
            for y in 0..8 {
                sum += temp[y * 8 + col] * cos[v][y];
            }
            coeffs[v * 8 + col] = c[v] * sum;
        }
    }
    coeffs
}

/// Inverse DCT: 64 coefficients → 64 samples (with the +128 level shift).
pub fn idct_8x8(coeffs: &[f64; 64]) -> [f64; 64] {
    let cos = cosine_table();
    let c = norm_table();

    // Columns.
    let mut temp = [0.0f64; 64];
    for col in 0..8 {
        for y in 0..8 {
            let mut sum = 0.0;
            for v in 0..8 {
                sum += c[v] * coeffs[v * 8 + col] * cos[v][y];
            }
            temp[y * 8 + col] = sum;
        }
    }

    // Rows.
    let mut samples = [0.0f64; 64];
    for row in 0..8 {
        for x in 0..8 {
            let mut sum = 0.0;
            for u in 0..8 {
                sum += c[u] * temp[row * 8 + u] * cos[u][x];
            }
            samples[row * 8 + x] = sum + 128.0;
        }
    }
    samples
}
