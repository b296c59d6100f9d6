// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Single-coefficient QIM embedding and extraction.
//!
//! Each 8×8 luma block carries one bit in a mid-frequency DCT coefficient.
//! The coefficient is moved to the nearest point of a lattice with step
//! `strength`: even multiples encode 0, odd multiples encode 1. JPEG
//! re-quantization at a finer or comparable step keeps the coefficient inside
//! its lattice cell, so the parity survives. The decision margin is
//! `strength / 2`.

use crate::raster::dct::{fdct_8x8, idct_8x8};
use crate::raster::LumaBlock;

/// Carrier coefficient row (vertical frequency).
pub const CARRIER_ROW: usize = 2;

/// Carrier coefficient column (horizontal frequency).
pub const CARRIER_COL: usize = 3;

/// Natural-order index of the carrier coefficient.
pub const CARRIER_INDEX: usize = CARRIER_ROW * 8 + CARRIER_COL;

/// Quantize `coef` to the nearest lattice point whose index parity is `bit`.
///
/// - bit 0: `{2n * strength}`
/// - bit 1: `{(2n + 1) * strength}`
fn quantize_for_bit(coef: f64, strength: f64, bit: u8) -> f64 {
    let offset = (bit & 1) as f64;
    (((coef / strength - offset) / 2.0).round() * 2.0 + offset) * strength
}

fn carrier(block: &LumaBlock) -> f64 {
    fdct_8x8(block)[CARRIER_INDEX]
}

/// Embed `bit` into the block's carrier coefficient, in place.
///
/// Only the carrier changes; the other 63 coefficients are untouched.
pub fn embed_bit(block: &mut LumaBlock, bit: u8, strength: f64) {
    debug_assert!(bit <= 1);
    let mut coeffs = fdct_8x8(block);
    coeffs[CARRIER_INDEX] = quantize_for_bit(coeffs[CARRIER_INDEX], strength, bit);
    *block = idct_8x8(&coeffs);
}

/// Extract the bit carried by a block: parity of the nearest lattice index.
pub fn extract_bit(block: &LumaBlock, strength: f64) -> u8 {
    ((carrier(block) / strength).round() as i64).rem_euclid(2) as u8
}

/// Distance of the carrier from the nearest decision boundary, in units of
/// `strength`: 0.5 for a freshly embedded block, 0.0 on a boundary.
pub fn coefficient_margin(block: &LumaBlock, strength: f64) -> f64 {
    let q = carrier(block) / strength;
    0.5 - (q - q.round()).abs()
}
